//! The task registry: labels, keys and the computations bound to them.
pub mod key;
pub mod registry;
pub mod types;

pub use key::{IntoKey, Key};
pub use registry::Registry;
pub use types::{Computation, Label, Task};
