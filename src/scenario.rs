//! The scenario store capability consumed by the reporter.

use crate::error::{ReportError, Result};
use crate::library::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;

/// A raw parameter as enumerated by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub dims: Vec<String>,
}

/// Read-only access to the raw data of one scenario.
///
/// Implementations may be slow or fail (e.g. a remote database); the engine
/// only calls them from inside `load_parameter` tasks and during
/// `Reporter::from_scenario`.
pub trait ScenarioStore: Send + Sync + Debug {
    fn parameters(&self) -> Result<Vec<ParameterInfo>>;
    fn parameter_data(&self, name: &str) -> Result<Quantity>;
}

/// A store holding its parameters in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryStore {
    parameters: BTreeMap<String, Quantity>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_parameter(mut self, name: impl Into<String>, data: Quantity) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, data: Quantity) -> Option<Quantity> {
        self.parameters.insert(name.into(), data)
    }

    /// Parses `{"parameters": {"<name>": <quantity table>, ...}}`.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Self::from_json_str(&text)
    }
}

impl ScenarioStore for InMemoryStore {
    fn parameters(&self) -> Result<Vec<ParameterInfo>> {
        Ok(self
            .parameters
            .iter()
            .map(|(name, q)| ParameterInfo { name: name.clone(), dims: q.dims().to_vec() })
            .collect())
    }

    fn parameter_data(&self, name: &str) -> Result<Quantity> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| ReportError::Store(format!("no parameter '{}'", name)))
    }
}
