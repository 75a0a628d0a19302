//! A synchronous, single-threaded graph executor.
use super::ledger::{Ledger, Value};
use crate::error::{ReportError, Result};
use crate::store::{Computation, Label, Registry};
use tracing::{debug, trace};

pub struct Engine<'a> {
    registry: &'a Registry,
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Resolves `target` and everything it depends on.
    pub fn compute(&self, target: &Label) -> Result<Value> {
        let mut ledger = Ledger::new();
        let value = self.resolve(target, &mut ledger)?;
        debug!(label = %target, evaluated = ledger.len(), "computed");
        Ok(value)
    }

    /// Resolves several targets against one ledger, so a dependency shared
    /// between them is evaluated once.
    pub fn compute_many(&self, targets: &[Label]) -> Result<Vec<Value>> {
        let mut ledger = Ledger::new();
        let values = targets
            .iter()
            .map(|t| self.resolve(t, &mut ledger))
            .collect::<Result<Vec<_>>>()?;
        debug!(targets = targets.len(), evaluated = ledger.len(), "computed");
        Ok(values)
    }

    /// Depth-first resolution of a single label. Each label is evaluated at
    /// most once per ledger; re-entering a label still on the stack is a cycle.
    fn resolve(&self, label: &Label, ledger: &mut Ledger) -> Result<Value> {
        if let Some(value) = ledger.get(label) {
            return Ok(value.clone());
        }
        let computation = self
            .registry
            .get(label)
            .ok_or_else(|| ReportError::UnresolvedLabel(label.clone()))?;
        if !ledger.begin(label) {
            return Err(ReportError::Cycle(label.clone()));
        }

        trace!(label = %label, "evaluate");
        let value = evaluate(computation, &mut |dep: &Label| self.resolve(dep, ledger))?;
        ledger.insert(label.clone(), value.clone());
        Ok(value)
    }
}

/// Evaluates one computation tree. Label references go through `resolve`;
/// the executors differ only in how they answer those.
pub(crate) fn evaluate(
    computation: &Computation,
    resolve: &mut dyn FnMut(&Label) -> Result<Value>,
) -> Result<Value> {
    match computation {
        Computation::Literal(value) => Ok(value.clone()),
        Computation::Alias(label) => resolve(label),
        Computation::Apply(task) => {
            let args = task
                .args
                .iter()
                .map(|arg| evaluate(arg, resolve))
                .collect::<Result<Vec<_>>>()?;
            trace!(op = task.op.name(), args = args.len(), "apply");
            task.op.call(&args)
        }
        Computation::Sequence(items) => items
            .iter()
            .map(|item| evaluate(item, resolve))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
    }
}
