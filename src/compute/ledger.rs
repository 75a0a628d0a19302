//! ledger.rs
//! Per-call memo of resolved values, plus the `Value` type the engine moves around.

use crate::library::Quantity;
use crate::scenario::ScenarioStore;
use crate::store::Label;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The atomic unit of data in the engine.
/// Quantities and store handles are shared, so cloning a value is cheap.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(f64),
    Text(String),
    Quantity(Arc<Quantity>),
    List(Vec<Value>),
    /// Handle to the external scenario store bound at the root label.
    Store(Arc<dyn ScenarioStore>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self { Value::Text(s.into()) }

    pub fn as_scalar(&self) -> Option<f64> {
        match self { Value::Scalar(s) => Some(*s), _ => None }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self { Value::Text(s) => Some(s), _ => None }
    }

    pub fn as_quantity(&self) -> Option<&Arc<Quantity>> {
        match self { Value::Quantity(q) => Some(q), _ => None }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self { Value::List(items) => Some(items), _ => None }
    }

    pub fn as_store(&self) -> Option<&Arc<dyn ScenarioStore>> {
        match self { Value::Store(s) => Some(s), _ => None }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Text(_) => "text",
            Value::Quantity(_) => "quantity",
            Value::List(_) => "list",
            Value::Store(_) => "store",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Quantity(a), Value::Quantity(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Store(a), Value::Store(b)) => Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Scalar(v) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Text(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Text(s) }
}

impl From<Quantity> for Value {
    fn from(q: Quantity) -> Self { Value::Quantity(Arc::new(q)) }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self { Value::List(items) }
}

impl From<Arc<dyn ScenarioStore>> for Value {
    fn from(store: Arc<dyn ScenarioStore>) -> Self { Value::Store(store) }
}

/// Values resolved so far during one executor call, and the labels whose
/// resolution is still on the stack. Dropped when the call returns.
#[derive(Debug, Default)]
pub struct Ledger {
    values: HashMap<Label, Value>,
    in_progress: HashSet<Label>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    #[inline(always)]
    pub fn get(&self, label: &Label) -> Option<&Value> { self.values.get(label) }

    /// Marks `label` as being resolved. Returns false if it already was,
    /// which means the walk has come back to it through a cycle.
    pub fn begin(&mut self, label: &Label) -> bool { self.in_progress.insert(label.clone()) }

    pub fn insert(&mut self, label: Label, value: Value) {
        self.in_progress.remove(&label);
        self.values.insert(label, value);
    }
}
