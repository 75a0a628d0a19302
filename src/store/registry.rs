use super::types::{Computation, Label};
use crate::error::{ReportError, Result};
use std::collections::HashMap;
use tracing::trace;

/// Label -> computation mapping. Owned by a single `Reporter`.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tasks: HashMap<Label, Computation>,
    // First-binding order, for stable listings.
    order: Vec<Label>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.tasks.len() }
    pub fn is_empty(&self) -> bool { self.tasks.is_empty() }

    pub fn contains(&self, label: &Label) -> bool { self.tasks.contains_key(label) }

    #[inline(always)]
    pub fn get(&self, label: &Label) -> Option<&Computation> { self.tasks.get(label) }

    /// Binds `computation` to `label`. With `strict`, an existing binding is
    /// an error and the registry is left untouched.
    pub fn add(&mut self, label: Label, computation: Computation, strict: bool) -> Result<()> {
        if strict && self.tasks.contains_key(&label) {
            return Err(ReportError::DuplicateKey(label));
        }
        self.insert(label, computation);
        Ok(())
    }

    /// Unconditional bind; overwrites any previous computation.
    pub fn insert(&mut self, label: Label, computation: Computation) {
        trace!(label = %label, "bind");
        if self.tasks.insert(label.clone(), computation).is_none() {
            self.order.push(label);
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> { self.order.iter() }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &Computation)> {
        self.order.iter().filter_map(move |l| self.tasks.get_key_value(l))
    }
}
