//! Executes the task graph.
pub mod engine;
pub mod ledger;
pub mod parallel;

pub use engine::Engine;
pub use ledger::{Ledger, Value};
pub use parallel::ParallelEngine;
