//! The reporting session: owns one task registry and evaluates it on request.

use crate::analysis::topology;
use crate::compute::{Engine, ParallelEngine, Value};
use crate::config::{ExecutorKind, ReporterConfig};
use crate::error::{ReportError, Result};
use crate::library::{Library, Operation, AGGREGATE, LOAD_FILE, LOAD_PARAMETER};
use crate::scenario::ScenarioStore;
use crate::store::{Computation, IntoKey, Key, Label, Registry};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// How `Reporter::disaggregate` splits a quantity.
#[derive(Debug, Clone)]
pub enum Method {
    /// Resolved as `disaggregate_<name>` in the reporter's library.
    Named(String),
    Op(Operation),
}

impl From<&str> for Method {
    fn from(name: &str) -> Self { Method::Named(name.to_string()) }
}

impl From<String> for Method {
    fn from(name: String) -> Self { Method::Named(name) }
}

impl From<Operation> for Method {
    fn from(op: Operation) -> Self { Method::Op(op) }
}

/// Derives quantities from a scenario.
///
/// Computations are registered under labels with [`add`](Self::add) and the
/// helpers, the store is bound with [`finalize`](Self::finalize), and
/// [`get`](Self::get) evaluates only what the requested label needs. Values
/// are memoized for the duration of a single `get`; nothing is cached between
/// calls.
///
/// Mutation takes `&mut self` and evaluation `&self`, so the registry never
/// changes while a `get` is running.
#[derive(Debug, Clone)]
pub struct Reporter {
    registry: Registry,
    library: Library,
    config: ReporterConfig,
}

impl Default for Reporter {
    fn default() -> Self { Self::new() }
}

impl Reporter {
    pub fn new() -> Self { Self::with_library(Library::standard(), ReporterConfig::default()) }

    pub fn with_config(config: ReporterConfig) -> Self { Self::with_library(Library::standard(), config) }

    pub fn with_library(library: Library, config: ReporterConfig) -> Self {
        Self { registry: Registry::new(), library, config }
    }

    /// Builds a reporter over every parameter of `store`, with the store bound.
    pub fn from_scenario(store: Arc<dyn ScenarioStore>) -> Result<Self> {
        Self::from_scenario_with(store, Library::standard(), ReporterConfig::default())
    }

    /// Each raw parameter becomes a base key bound to a lazy load from the
    /// root label. With `config.aggregates`, every aggregate of each base key
    /// is registered too. No parameter data is read here.
    pub fn from_scenario_with(store: Arc<dyn ScenarioStore>, library: Library, config: ReporterConfig) -> Result<Self> {
        let mut rep = Self::with_library(library, config);
        let load = rep.library.require(LOAD_PARAMETER)?;
        let parameters = store.parameters()?;
        rep.finalize(store);

        let root = rep.root_label();
        for par in parameters {
            let key = Key::new(par.name.as_str(), par.dims)?;
            let task = Computation::apply(
                load.clone(),
                vec![Computation::literal(par.name), Computation::alias(root.clone())],
            );
            rep.add(key.clone(), task, false)?;
            if rep.config.aggregates {
                rep.add_aggregates(&key)?;
            }
        }
        debug!(labels = rep.registry.count(), "reporter built from scenario");
        Ok(rep)
    }

    // --- Registry mutation ---

    /// Binds `computation` to `label`. With `strict`, rebinding an existing
    /// label fails. Referenced labels need not exist yet.
    pub fn add(&mut self, label: impl Into<Label>, computation: impl Into<Computation>, strict: bool) -> Result<()> {
        let label = label.into();
        debug!(label = %label, strict, "add");
        self.registry.add(label, computation.into(), strict)
    }

    /// Merges `entries`, overwriting existing bindings.
    pub fn add_many<I, L, C>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (L, C)>,
        L: Into<Label>,
        C: Into<Computation>,
    {
        for (label, computation) in entries {
            self.registry.insert(label.into(), computation.into());
        }
    }

    /// Registers the aggregates of `key` over every subset of its dimensions:
    /// `2^|D| - 1` keys for `|D|` dimensions. Each aggregate is computed from
    /// a key with one more dimension, so shared partial sums are reused within
    /// a `get`. Labels that are already bound keep their binding. Returns how
    /// many keys were added.
    pub fn add_aggregates(&mut self, key: &Key) -> Result<usize> {
        let op = self.library.require(AGGREGATE)?;
        let mut seen: HashSet<Key> = HashSet::new();
        let mut queue = VecDeque::from([key.clone()]);
        let mut added = 0;

        while let Some(current) = queue.pop_front() {
            for (agg, task) in current.aggregates(&op) {
                if !seen.insert(agg.clone()) {
                    continue;
                }
                if self.bind_new(&agg, task) {
                    added += 1;
                }
                queue.push_back(agg);
            }
        }
        debug!(key = %key, added, "aggregates");
        Ok(added)
    }

    /// Registers only the `|D|` aggregates that drop one dimension of `key`.
    /// Deeper aggregates can be added later by calling this on the results.
    /// Labels that are already bound keep their binding.
    pub fn add_direct_aggregates(&mut self, key: &Key) -> Result<usize> {
        let op = self.library.require(AGGREGATE)?;
        let mut added = 0;
        for (agg, task) in key.aggregates(&op) {
            if self.bind_new(&agg, task) {
                added += 1;
            }
        }
        debug!(key = %key, added, "direct aggregates");
        Ok(added)
    }

    fn bind_new(&mut self, key: &Key, task: Computation) -> bool {
        let label = Label::from(key);
        if self.registry.contains(&label) {
            return false;
        }
        self.registry.insert(label, task);
        true
    }

    /// Binds the root label to `store`. Calling it again rebinds.
    pub fn finalize(&mut self, store: Arc<dyn ScenarioStore>) {
        let root = self.root_label();
        debug!(root = %root, "finalize");
        self.registry.insert(root, Computation::literal(store));
    }

    /// Binds `var` extended by `new_dim` to `method(var, args...)` and returns
    /// the new key. `None` uses the configured default method. Any existing
    /// binding of the new key is replaced.
    ///
    /// A quantity returned by the method must carry exactly the dimensions of
    /// the new key; otherwise evaluating the key fails with a computation error.
    pub fn disaggregate(
        &mut self,
        var: impl IntoKey,
        new_dim: &str,
        method: Option<Method>,
        args: Vec<Computation>,
    ) -> Result<Key> {
        let var = var.into_key()?;
        let key = var.with_dim_appended(new_dim)?;

        let op = match method {
            Some(Method::Op(op)) => op,
            Some(Method::Named(name)) => self.library.disaggregation(&name)?,
            None => self.library.disaggregation(&self.config.default_method)?,
        };

        let mut task_args = Vec::with_capacity(args.len() + 1);
        task_args.push(Computation::alias(var));
        task_args.extend(args);

        debug!(key = %key, method = op.name(), "disaggregate");
        let checked = expect_dims(op, key.clone());
        self.registry.insert(key.clone().into(), Computation::apply(checked, task_args));
        Ok(key)
    }

    /// Registers `<file_prefix><path>` as a lazy load of `path`. The file is
    /// read only when the returned label (or a dependent) is requested.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<Label> {
        let path = path.as_ref();
        let op = self.library.require(LOAD_FILE)?;
        let label = Label::from(format!("{}{}", self.config.file_prefix, path.display()));
        let task = Computation::apply(op, vec![Computation::literal(path.display().to_string())]);
        self.add(label.clone(), task, false)?;
        Ok(label)
    }

    // --- Evaluation ---

    /// Computes `label` and only what it depends on.
    pub fn get(&self, label: impl Into<Label>) -> Result<Value> {
        let label = label.into();
        match self.config.executor {
            ExecutorKind::Sequential => Engine::new(&self.registry).compute(&label),
            ExecutorKind::Parallel => ParallelEngine::new(&self.registry).compute(&label),
        }
    }

    /// Computes several labels in one pass; shared dependencies are evaluated once.
    pub fn get_many<I, L>(&self, labels: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        let labels: Vec<Label> = labels.into_iter().map(Into::into).collect();
        match self.config.executor {
            ExecutorKind::Sequential => Engine::new(&self.registry).compute_many(&labels),
            ExecutorKind::Parallel => ParallelEngine::new(&self.registry).compute_many(&labels),
        }
    }

    // --- Inspection ---

    /// Checks the whole registry for cycles and unbound references.
    pub fn validate(&self) -> Result<()> {
        topology::sort(&self.registry).map(|_| ())
    }

    /// The order in which `label` and its dependencies would be evaluated.
    pub fn topological_order(&self, label: impl Into<Label>) -> Result<Vec<Label>> {
        topology::closure(&self.registry, &[label.into()])?.order()
    }

    /// The registered key named `name` with the most dimensions.
    pub fn full_key(&self, name: &str) -> Option<&Key> {
        self.registry
            .labels()
            .filter_map(Label::as_key)
            .filter(|k| k.name() == name)
            .max_by_key(|k| k.dims().len())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Label> { self.registry.labels() }
    pub fn contains(&self, label: impl Into<Label>) -> bool { self.registry.contains(&label.into()) }
    pub fn root_label(&self) -> Label { Label::from(self.config.root_label.as_str()) }
    pub fn registry(&self) -> &Registry { &self.registry }
    pub fn library(&self) -> &Library { &self.library }
    pub fn config(&self) -> &ReporterConfig { &self.config }
}

/// Wraps `op` so that a quantity it returns must have the dimensions of `key`.
fn expect_dims(op: Operation, key: Key) -> Operation {
    let name = op.name().to_string();
    Operation::new(name.clone(), move |args| {
        let value = op.call(args)?;
        if let Some(q) = value.as_quantity() {
            let matches = q.dims().len() == key.dims().len() && q.dims().iter().all(|d| key.has_dim(d));
            if !matches {
                return Err(ReportError::computation(
                    &name,
                    format!("result has dimensions {:?}, expected those of '{}'", q.dims(), key),
                ));
            }
        }
        Ok(value)
    })
}
