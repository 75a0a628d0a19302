//! Structural analysis of the task registry.
pub mod topology;
