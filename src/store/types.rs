use super::key::Key;
use crate::compute::ledger::Value;
use crate::library::Operation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a registry entry: either a dimensioned `Key` or a plain name.
///
/// Every conversion goes through `From<Key>`, so a `Key` without dimensions
/// and the bare text `"x"` address one entry, and the string `"a:b-c"` is the
/// same label as `Key::parse("a:b-c")`. Text that does not parse as a key
/// stays an opaque name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Label(Repr);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Key(Key),
    Name(String),
}

impl Label {
    pub fn as_key(&self) -> Option<&Key> {
        match &self.0 {
            Repr::Key(key) => Some(key),
            Repr::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match &self.0 {
            Repr::Key(_) => None,
            Repr::Name(name) => Some(name),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Key(key) => key.fmt(f),
            Repr::Name(name) => f.write_str(name),
        }
    }
}

impl From<Key> for Label {
    fn from(key: Key) -> Self {
        if key.dims().is_empty() {
            Label(Repr::Name(key.name().to_string()))
        } else {
            Label(Repr::Key(key))
        }
    }
}

impl From<&Key> for Label {
    fn from(key: &Key) -> Self { Label::from(key.clone()) }
}

impl From<String> for Label {
    fn from(text: String) -> Self {
        match Key::parse(&text) {
            Ok(key) => Label::from(key),
            Err(_) => Label(Repr::Name(text)),
        }
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Self { Label::from(text.to_string()) }
}

impl From<&Label> for Label {
    fn from(label: &Label) -> Self { label.clone() }
}

impl From<Label> for String {
    fn from(label: Label) -> Self { label.to_string() }
}

/// An operation plus the computations producing its arguments.
#[derive(Debug, Clone)]
pub struct Task {
    pub op: Operation,
    pub args: Vec<Computation>,
}

/// The computation bound to a label.
#[derive(Debug, Clone)]
pub enum Computation {
    /// A constant; no dependencies.
    Literal(Value),
    /// Reference to another label, resolved transitively.
    Alias(Label),
    /// Operation applied to resolved arguments.
    Apply(Task),
    /// Fan-out; evaluates to the list of resolved elements.
    Sequence(Vec<Computation>),
}

impl Computation {
    pub fn literal(value: impl Into<Value>) -> Self { Computation::Literal(value.into()) }

    pub fn alias(label: impl Into<Label>) -> Self { Computation::Alias(label.into()) }

    pub fn apply(op: Operation, args: Vec<Computation>) -> Self {
        Computation::Apply(Task { op, args })
    }

    pub fn sequence(items: Vec<Computation>) -> Self { Computation::Sequence(items) }

    /// Labels this computation refers to directly, in argument order.
    pub fn dependencies(&self) -> Vec<&Label> {
        let mut out = Vec::new();
        self.collect_dependencies(&mut out);
        out
    }

    fn collect_dependencies<'a>(&'a self, out: &mut Vec<&'a Label>) {
        match self {
            Computation::Literal(_) => {}
            Computation::Alias(label) => out.push(label),
            Computation::Apply(task) => task.args.iter().for_each(|a| a.collect_dependencies(out)),
            Computation::Sequence(items) => items.iter().for_each(|a| a.collect_dependencies(out)),
        }
    }
}

impl From<Value> for Computation {
    fn from(value: Value) -> Self { Computation::Literal(value) }
}

impl From<f64> for Computation {
    fn from(value: f64) -> Self { Computation::Literal(Value::Scalar(value)) }
}

impl From<Task> for Computation {
    fn from(task: Task) -> Self { Computation::Apply(task) }
}

impl From<Vec<Computation>> for Computation {
    fn from(items: Vec<Computation>) -> Self { Computation::Sequence(items) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("demand:region-year", "demand:year-region")]
    #[case("total", "total")]
    fn test_text_and_key_address_one_label(#[case] text: &str, #[case] other_order: &str) {
        let key = Key::parse(text).unwrap();
        assert_eq!(Label::from(text), Label::from(key.clone()));
        assert_eq!(Label::from(other_order), Label::from(key));
    }

    #[rstest]
    #[case("x:")]
    #[case("x:a--b")]
    #[case("")]
    fn test_unparseable_text_is_a_name(#[case] text: &str) {
        let label = Label::from(text);
        assert_eq!(label.as_name(), Some(text));
        assert_eq!(label.to_string(), text);
    }

    #[test]
    fn test_serde_normalises_like_from() {
        let label: Label = serde_json::from_str("\"demand:region\"").unwrap();
        assert_eq!(label, Label::from(Key::parse("demand:region").unwrap()));

        let name: Label = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(name, Label::from(Key::parse("x").unwrap()));
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"x\"");
    }
}
