//! Lazy, memoized evaluation of dimensioned reporting quantities.
//!
//! A [`Reporter`] owns a registry of computations keyed by [`Label`]s
//! (usually dimensioned [`Key`]s such as `demand:region-year`). Aggregates
//! and disaggregations are synthesized as ordinary tasks; `get` evaluates
//! only the dependency closure of the requested label, each node once.

pub mod analysis;
pub mod compute;
pub mod config;
pub mod error;
pub mod library;
pub mod reporter;
pub mod scenario;
pub mod store;

pub use compute::Value;
pub use config::{ExecutorKind, ReporterConfig};
pub use error::{ReportError, Result};
pub use library::{Library, Operation, Quantity};
pub use reporter::{Method, Reporter};
pub use scenario::{InMemoryStore, ParameterInfo, ScenarioStore};
pub use store::{Computation, IntoKey, Key, Label, Task};
