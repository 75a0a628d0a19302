//! Error types shared by the registry, the executors and the computation library.

use crate::store::Label;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("Invalid key format: {0:?}")]
    Format(String),
    #[error("Dimension '{dim}' is already present in key '{key}'")]
    DuplicateDimension { key: String, dim: String },
    #[error("Label '{0}' is already bound")]
    DuplicateKey(Label),
    #[error("No disaggregation method '{0}'")]
    MethodNotFound(String),
    #[error("Invalid disaggregation method: {0:?}")]
    InvalidMethod(String),
    #[error("Cycle detected involving '{0}'")]
    Cycle(Label),
    #[error("Label '{0}' is not bound to any computation")]
    UnresolvedLabel(Label),

    // Raised by operations; the executors pass these through untouched.
    #[error("Operation '{op}' failed: {message}")]
    Computation { op: String, message: String },
    #[error("Store error: {0}")]
    Store(String),
    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReportError {
    pub fn computation(op: &str, message: impl Into<String>) -> Self {
        Self::Computation { op: op.to_string(), message: message.into() }
    }

    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().display().to_string(), message: err.to_string() }
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
