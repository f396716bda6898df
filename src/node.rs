//! Embedded dataset tree
//!
//! The data blobs on a detail page are positional: arrays of arrays holding
//! strings, numbers, booleans and nulls. `Node` models exactly that shape so
//! traversal can match exhaustively instead of probing a dynamic value.

use serde_json::{Number, Value};
use std::collections::HashMap;

/// One value inside an embedded dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Node>),
}

impl Node {
    /// Descend through nested arrays by index.
    ///
    /// Returns `None` as soon as a step hits a non-array (including `Null`)
    /// or an index past the end; later steps are not looked at.
    pub fn at(&self, indices: &[usize]) -> Option<&Node> {
        let mut current = self;
        for &index in indices {
            current = match current {
                Node::Array(items) => items.get(index)?,
                Node::Null | Node::Bool(_) | Node::Number(_) | Node::String(_) => return None,
            };
        }
        Some(current)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Loose truthiness as used by page flags: empty strings, zero and null
    /// are false, any array is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Node::Null => false,
            Node::Bool(b) => *b,
            Node::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Node::String(s) => !s.is_empty(),
            Node::Array(_) => true,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Array(_) => "array",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::Array(items) => Value::Array(items.iter().map(Node::to_json).collect()),
        }
    }
}

/// Objects never appear at a position the mappings address, so they collapse
/// to `Null`.
impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null | Value::Object(_) => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
        }
    }
}

/// Parsed datasets of one page, keyed by dataset id (`"ds:4"`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    entries: HashMap<String, Node>,
}

impl Datasets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object of `key -> data`; anything else yields an
    /// empty container.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into_iter().map(|(k, v)| (k, Node::from(v))).collect(),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, node: Node) {
        self.entries.insert(key.into(), node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Node)> for Datasets {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_at_descends_arrays() {
        let node = Node::from(json!([[1, ["deep"]], null]));
        assert_eq!(node.at(&[0, 1, 0]), Some(&Node::String("deep".to_string())));
        assert_eq!(node.at(&[]), Some(&node));
        assert_eq!(node.at(&[1]), Some(&Node::Null));
    }

    #[test]
    fn test_at_short_circuits() {
        let node = Node::from(json!([null, "text", [1]]));
        assert_eq!(node.at(&[0, 0]), None);
        assert_eq!(node.at(&[1, 0]), None);
        assert_eq!(node.at(&[2, 5]), None);
        assert_eq!(node.at(&[9, 0, 0]), None);
    }

    #[test]
    fn test_objects_collapse_to_null() {
        let node = Node::from(json!([{"a": 1}, 2]));
        assert_eq!(node.at(&[0]), Some(&Node::Null));
        assert_eq!(node.to_json(), json!([null, 2]));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Node::Null.is_truthy());
        assert!(!Node::from(json!(0)).is_truthy());
        assert!(!Node::from(json!("")).is_truthy());
        assert!(!Node::Bool(false).is_truthy());
        assert!(Node::from(json!(0.5)).is_truthy());
        assert!(Node::from(json!("$0.99 - $9.99")).is_truthy());
        assert!(Node::from(json!([])).is_truthy());
    }

    #[test]
    fn test_datasets_from_json() {
        let datasets = Datasets::from_json(json!({"ds:4": [1, 2], "ds:8": null}));
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets.get("ds:8"), Some(&Node::Null));
        assert!(datasets.get("ds:5").is_none());
        assert!(Datasets::from_json(json!([1])).is_empty());
    }
}
