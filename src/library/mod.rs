//! The computation library: named operations the task graph can invoke.
//!
//! The set of operations is closed and owned by the host: a `Reporter` only
//! resolves names against the `Library` it was built with.

pub mod ops;
pub mod quantity;

pub use quantity::Quantity;

use crate::compute::ledger::Value;
use crate::error::{ReportError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const AGGREGATE: &str = "aggregate";
pub const LOAD_FILE: &str = "load_file";
pub const LOAD_PARAMETER: &str = "load_parameter";
pub const DISAGGREGATE_PREFIX: &str = "disaggregate_";

pub type OpFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A named, shareable function of resolved argument values.
#[derive(Clone)]
pub struct Operation {
    name: Arc<str>,
    func: Arc<OpFn>,
}

impl Operation {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self { name: Arc::from(name.into()), func: Arc::new(func) }
    }

    pub fn name(&self) -> &str { &self.name }

    #[inline]
    pub fn call(&self, args: &[Value]) -> Result<Value> { (self.func)(args) }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Operation").field(&self.name).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Library {
    ops: HashMap<String, Operation>,
}

impl Library {
    /// An empty catalogue.
    pub fn new() -> Self { Self::default() }

    /// Aggregation, share disaggregation, file and store loaders.
    pub fn standard() -> Self {
        let mut lib = Self::new();
        lib.register(Operation::new(AGGREGATE, ops::aggregate));
        lib.register(Operation::new("disaggregate_shares", ops::disaggregate_shares));
        lib.register(Operation::new(LOAD_FILE, ops::load_file));
        lib.register(Operation::new(LOAD_PARAMETER, ops::load_parameter));
        lib
    }

    /// Adds `op` under its own name, returning any operation it replaces.
    pub fn register(&mut self, op: Operation) -> Option<Operation> {
        self.ops.insert(op.name().to_string(), op)
    }

    pub fn get(&self, name: &str) -> Option<&Operation> { self.ops.get(name) }

    pub fn require(&self, name: &str) -> Result<Operation> {
        self.ops.get(name).cloned().ok_or_else(|| ReportError::MethodNotFound(name.to_string()))
    }

    /// Looks up `disaggregate_<method>`.
    pub fn disaggregation(&self, method: &str) -> Result<Operation> {
        if method.is_empty() || method.chars().any(char::is_whitespace) {
            return Err(ReportError::InvalidMethod(method.to_string()));
        }
        self.require(&format!("{}{}", DISAGGREGATE_PREFIX, method))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.ops.keys().map(String::as_str) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_standard_catalogue() {
        let lib = Library::standard();
        for name in [AGGREGATE, LOAD_FILE, LOAD_PARAMETER, "disaggregate_shares"] {
            assert!(lib.get(name).is_some(), "missing {}", name);
        }
        assert_eq!(lib.disaggregation("shares").unwrap().name(), "disaggregate_shares");
    }

    #[rstest]
    #[case("weights", ReportError::MethodNotFound("disaggregate_weights".into()))]
    #[case("", ReportError::InvalidMethod("".into()))]
    #[case("by share", ReportError::InvalidMethod("by share".into()))]
    fn test_disaggregation_lookup_errors(#[case] method: &str, #[case] expected: ReportError) {
        assert_eq!(Library::standard().disaggregation(method).unwrap_err(), expected);
    }

    #[test]
    fn test_register_custom_method() {
        let mut lib = Library::standard();
        let replaced = lib.register(Operation::new("disaggregate_even", |args| Ok(args[0].clone())));
        assert!(replaced.is_none());
        assert_eq!(lib.disaggregation("even").unwrap().name(), "disaggregate_even");
        assert!(Library::new().require(AGGREGATE).is_err());
    }
}
