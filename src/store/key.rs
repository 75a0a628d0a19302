//! key.rs
//! Dimensioned quantity identifiers and the aggregation synthesizer.

use super::types::Computation;
use crate::compute::ledger::Value;
use crate::error::{ReportError, Result};
use crate::library::Operation;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Identifier for a dimensioned quantity, e.g. `demand:region-year`.
///
/// Equality and hashing ignore the order of `dims`, so `demand:region-year`
/// and `demand:year-region` address the same registry entry. `Display` keeps
/// the order the dimensions were declared in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    name: String,
    dims: SmallVec<[String; 4]>,
}

impl Key {
    pub fn new<I, S>(name: impl Into<String>, dims: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(ReportError::Format(name));
        }
        let mut key = Self { name, dims: SmallVec::new() };
        for dim in dims {
            let dim = dim.into();
            if dim.is_empty() || key.has_dim(&dim) {
                return Err(ReportError::Format(format!("{}:{}", key, dim)));
            }
            key.dims.push(dim);
        }
        Ok(key)
    }

    /// Parses the canonical `name:dim1-dim2` form. A string without `:` is a
    /// key with no dimensions.
    pub fn parse(s: &str) -> Result<Self> {
        let (name, dims) = match s.split_once(':') {
            Some((name, dims)) => (name, Some(dims)),
            None => (s, None),
        };
        if name.is_empty() {
            return Err(ReportError::Format(s.to_string()));
        }

        let mut key = Self { name: name.to_string(), dims: SmallVec::new() };
        if let Some(dims) = dims {
            for dim in dims.split('-') {
                if dim.is_empty() || key.has_dim(dim) {
                    return Err(ReportError::Format(s.to_string()));
                }
                key.dims.push(dim.to_string());
            }
        }
        Ok(key)
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn dims(&self) -> &[String] { &self.dims }
    pub fn has_dim(&self, dim: &str) -> bool { self.dims.iter().any(|d| d == dim) }

    /// Returns a copy of this key with `dim` appended.
    pub fn with_dim_appended(&self, dim: &str) -> Result<Self> {
        if dim.is_empty() {
            return Err(ReportError::Format(format!("{}-", self)));
        }
        if self.has_dim(dim) {
            return Err(ReportError::DuplicateDimension { key: self.to_string(), dim: dim.to_string() });
        }
        let mut key = self.clone();
        key.dims.push(dim.to_string());
        Ok(key)
    }

    /// Returns a copy of this key with `dim` removed, or `None` if absent.
    pub fn without_dim(&self, dim: &str) -> Option<Self> {
        if !self.has_dim(dim) {
            return None;
        }
        let dims = self.dims.iter().filter(|d| *d != dim).cloned().collect();
        Some(Self { name: self.name.clone(), dims })
    }

    /// Synthesizes one aggregate per dimension: the key with that dimension
    /// dropped, bound to `op(self, dim)`.
    ///
    /// Nothing is inserted anywhere; callers merge the result into a registry.
    /// Aggregates over several dimensions come from applying this again to
    /// the returned keys.
    pub fn aggregates(&self, op: &Operation) -> Vec<(Key, Computation)> {
        self.dims
            .iter()
            .filter_map(|dim| {
                let reduced = self.without_dim(dim)?;
                let task = Computation::apply(
                    op.clone(),
                    vec![Computation::alias(self.clone()), Computation::literal(Value::text(dim))],
                );
                Some((reduced, task))
            })
            .collect()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.dims.len() == other.dims.len()
            && self.dims.iter().all(|d| other.has_dim(d))
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        let mut dims: SmallVec<[&str; 4]> = self.dims.iter().map(String::as_str).collect();
        dims.sort_unstable();
        dims.hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dims.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.name, self.dims.join("-"))
        }
    }
}

impl FromStr for Key {
    type Err = ReportError;
    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for Key {
    type Error = ReportError;
    fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<Key> for String {
    fn from(key: Key) -> Self { key.to_string() }
}

/// Conversion used wherever an API accepts "a key or its string form".
pub trait IntoKey {
    fn into_key(self) -> Result<Key>;
}

impl IntoKey for Key {
    fn into_key(self) -> Result<Key> { Ok(self) }
}

impl IntoKey for &Key {
    fn into_key(self) -> Result<Key> { Ok(self.clone()) }
}

impl IntoKey for &str {
    fn into_key(self) -> Result<Key> { Key::parse(self) }
}

impl IntoKey for String {
    fn into_key(self) -> Result<Key> { Key::parse(&self) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Label;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("demand", "demand", 0)]
    #[case("demand:region", "demand", 1)]
    #[case("demand:region-year", "demand", 2)]
    #[case("x:a-b-c", "x", 3)]
    fn test_parse_valid(#[case] input: &str, #[case] name: &str, #[case] n_dims: usize) {
        let key = Key::parse(input).unwrap();
        assert_eq!(key.name(), name);
        assert_eq!(key.dims().len(), n_dims);
        assert_eq!(key.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case(":region")]
    #[case("demand:")]
    #[case("demand:region--year")]
    #[case("demand:region-region")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(matches!(Key::parse(input), Err(ReportError::Format(_))), "Should fail: '{}'", input);
    }

    #[test]
    fn test_equality_ignores_dim_order() {
        let a = Key::parse("demand:region-year").unwrap();
        let b = Key::parse("demand:year-region").unwrap();
        assert_eq!(a, b);
        assert_ne!(a.to_string(), b.to_string());

        let set: HashSet<Key> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_ne!(Key::parse("demand:region").unwrap(), Key::parse("supply:region").unwrap());
    }

    #[test]
    fn test_with_dim_appended_copies() {
        let base = Key::parse("demand:region").unwrap();
        let extended = base.with_dim_appended("sector").unwrap();
        assert_eq!(extended.to_string(), "demand:region-sector");
        assert_eq!(base.to_string(), "demand:region");

        let err = extended.with_dim_appended("region").unwrap_err();
        assert!(matches!(err, ReportError::DuplicateDimension { .. }));
    }

    #[test]
    fn test_aggregates_drop_one_dim_each() {
        let op = Operation::new("sum", |_| Ok(Value::Scalar(0.0)));
        let base = Key::parse("demand:region-year-sector").unwrap();
        let aggs = base.aggregates(&op);
        let keys: HashSet<String> = aggs.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(
            keys,
            ["demand:year-sector", "demand:region-sector", "demand:region-year"]
                .into_iter()
                .map(String::from)
                .collect()
        );

        let (_, task) = &aggs[0];
        let deps: Vec<&Label> = task.dependencies();
        assert_eq!(deps, vec![&Label::from(base.clone())]);

        assert!(Key::parse("scalar").unwrap().aggregates(&op).is_empty());
    }

    #[test]
    fn test_serde_uses_canonical_form() {
        let key = Key::parse("demand:region-year").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"demand:region-year\"");
        let back: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<Key>("\"demand:\"").is_err());
    }
}
