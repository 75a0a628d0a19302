//! Layered executor: evaluates independent subtrees on the rayon pool.
use super::engine::evaluate;
use super::ledger::{Ledger, Value};
use crate::analysis::topology;
use crate::error::{ReportError, Result};
use crate::store::{Label, Registry};
use rayon::prelude::*;
use tracing::{debug, trace};

pub struct ParallelEngine<'a> {
    registry: &'a Registry,
}

impl<'a> ParallelEngine<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    pub fn compute(&self, target: &Label) -> Result<Value> {
        self.compute_many(std::slice::from_ref(target))?
            .into_iter()
            .next()
            .ok_or_else(|| ReportError::UnresolvedLabel(target.clone()))
    }

    /// Builds the dependency closure of `targets`, then evaluates it layer by
    /// layer. Every label in the closure is evaluated exactly once.
    ///
    /// When several labels of one layer fail, which error is returned is not
    /// specified.
    pub fn compute_many(&self, targets: &[Label]) -> Result<Vec<Value>> {
        let layers = topology::closure(self.registry, targets)?.layers()?;
        let mut ledger = Ledger::new();

        for (depth, layer) in layers.into_iter().enumerate() {
            trace!(depth, width = layer.len(), "layer");
            let resolved = layer
                .into_par_iter()
                .map(|label| -> Result<(Label, Value)> {
                    let computation = self
                        .registry
                        .get(&label)
                        .ok_or_else(|| ReportError::UnresolvedLabel(label.clone()))?;
                    // Lower layers are complete, so every reference is already in the ledger.
                    let value = evaluate(computation, &mut |dep: &Label| {
                        ledger.get(dep).cloned().ok_or_else(|| ReportError::UnresolvedLabel(dep.clone()))
                    })?;
                    Ok((label, value))
                })
                .collect::<Result<Vec<_>>>()?;

            for (label, value) in resolved {
                ledger.insert(label, value);
            }
        }

        debug!(targets = targets.len(), evaluated = ledger.len(), "computed");
        targets
            .iter()
            .map(|t| ledger.get(t).cloned().ok_or_else(|| ReportError::UnresolvedLabel(t.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Engine;
    use crate::library::Operation;
    use crate::store::Computation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sum() -> Operation {
        Operation::new("sum", |args| Ok(Value::Scalar(args.iter().filter_map(Value::as_scalar).sum())))
    }

    #[test]
    fn test_wide_graph_matches_sequential() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let shared = Operation::new("shared", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Scalar(1.0))
        });

        let mut reg = Registry::new();
        reg.insert("base".into(), Computation::apply(shared, vec![]));
        let mut leaves = Vec::new();
        for i in 0..32 {
            let label = format!("leaf{}", i);
            reg.insert(
                label.clone().into(),
                Computation::apply(sum(), vec![Computation::alias("base"), (i as f64).into()]),
            );
            leaves.push(Computation::alias(label));
        }
        reg.insert("total".into(), Computation::apply(sum(), leaves));

        let parallel = ParallelEngine::new(&reg).compute(&"total".into()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let sequential = Engine::new(&reg).compute(&"total".into()).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel, Value::Scalar(32.0 + (0..32).sum::<i32>() as f64));
    }

    #[test]
    fn test_sequences_resolve_inside_layers() {
        let mut reg = Registry::new();
        reg.insert("x".into(), 4.0.into());
        reg.insert("y".into(), Computation::alias("x"));
        reg.insert(
            "both".into(),
            Computation::sequence(vec![Computation::alias("y"), Computation::literal("lit")]),
        );
        reg.insert(
            "nested".into(),
            Computation::apply(
                sum(),
                vec![Computation::sequence(vec![Computation::alias("x")]), Computation::alias("y"), 1.0.into()],
            ),
        );

        let engine = ParallelEngine::new(&reg);
        let values = engine.compute_many(&["both".into(), "nested".into()]).unwrap();
        assert_eq!(values[0], Value::List(vec![Value::Scalar(4.0), Value::text("lit")]));
        // `sum` skips the list argument.
        assert_eq!(values[1], Value::Scalar(5.0));
        assert_eq!(values, Engine::new(&reg).compute_many(&["both".into(), "nested".into()]).unwrap());
    }

    #[test]
    fn test_errors_match_sequential_contract() {
        let mut reg = Registry::new();
        reg.insert("p".into(), Computation::alias("q"));
        reg.insert("q".into(), Computation::alias("p"));
        reg.insert("y".into(), Computation::apply(sum(), vec![Computation::alias("z")]));

        let engine = ParallelEngine::new(&reg);
        assert!(matches!(engine.compute(&"p".into()), Err(ReportError::Cycle(_))));
        assert_eq!(engine.compute(&"y".into()), Err(ReportError::UnresolvedLabel("z".into())));
        assert_eq!(engine.compute(&"nothing".into()), Err(ReportError::UnresolvedLabel("nothing".into())));
    }
}
