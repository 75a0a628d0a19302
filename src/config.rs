//! Reporter settings, loadable from JSON.

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Depth-first on the calling thread.
    #[default]
    Sequential,
    /// Dependency layers evaluated on the rayon pool.
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReporterConfig {
    /// Label the store handle is bound to by `finalize`.
    pub root_label: String,
    /// Method used by `disaggregate` when none is given.
    pub default_method: String,
    /// Prefix of the labels created by `add_file`.
    pub file_prefix: String,
    pub executor: ExecutorKind,
    /// Whether `from_scenario` also registers aggregates of each parameter.
    pub aggregates: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            root_label: "scenario".to_string(),
            default_method: "shares".to_string(),
            file_prefix: "file:".to_string(),
            executor: ExecutorKind::Sequential,
            aggregates: true,
        }
    }
}

impl ReporterConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s).map_err(|e| ReportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root_label.is_empty() {
            return Err(ReportError::Config("root_label must not be empty".to_string()));
        }
        if self.default_method.is_empty() {
            return Err(ReportError::Config("default_method must not be empty".to_string()));
        }
        Ok(())
    }
}
