//! Document flattening.
//!
//! Converts a nested JSON document into an ordered sequence of path-value
//! entries. Paths use dot-separated keys with bracketed integer indices for
//! array positions, e.g. `root.children[2].meta.name`. The traversal is
//! deterministic: depth-first, array indices ascending, object keys in
//! source order.

use serde_json::Value;
use std::fmt;

use crate::error::DocumentError;

/// Recursion guard. serde_json values cannot be cyclic, so this only trips
/// on pathologically deep documents.
const MAX_DEPTH: usize = 128;

/// A scalar leaf value from the source document.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else {
                    Some(Self::Float(n.as_f64().unwrap_or_default()))
                }
            }
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// One path-value pair produced by flattening. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatEntry {
    pub path: String,
    pub value: PropertyValue,
}

impl FlatEntry {
    pub fn new(path: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

/// Flatten a decoded document into ordered path-value entries.
///
/// Empty containers yield no entry; nulls yield [`PropertyValue::Null`].
/// Single pass, linear in the number of document nodes.
pub fn flatten(document: &Value) -> Result<Vec<FlatEntry>, DocumentError> {
    let Value::Object(map) = document else {
        return Err(DocumentError::NotAnObject);
    };

    let mut entries = Vec::new();
    for (key, value) in map {
        walk(key.clone(), value, &mut entries, 1)?;
    }
    Ok(entries)
}

fn walk(
    path: String,
    value: &Value,
    out: &mut Vec<FlatEntry>,
    depth: usize,
) -> Result<(), DocumentError> {
    if depth > MAX_DEPTH {
        return Err(DocumentError::DepthExceeded {
            path,
            limit: MAX_DEPTH,
        });
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                walk(format!("{path}.{key}"), child, out, depth + 1)?;
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                walk(format!("{path}[{index}]"), child, out, depth + 1)?;
            }
        }
        scalar => {
            if let Some(value) = PropertyValue::from_scalar(scalar) {
                out.push(FlatEntry { path, value });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(entries: &[FlatEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn flattens_nested_objects_in_source_order() {
        let doc = json!({
            "root": {
                "meta": { "name": "Btn1" },
                "type": "button"
            }
        });
        let entries = flatten(&doc).unwrap();
        assert_eq!(paths(&entries), vec!["root.meta.name", "root.type"]);
        assert_eq!(
            entries[0].value,
            PropertyValue::Str("Btn1".to_string())
        );
    }

    #[test]
    fn flattens_arrays_with_ascending_indices() {
        let doc = json!({
            "items": [ { "a": 1 }, { "a": 2 }, "tail" ]
        });
        let entries = flatten(&doc).unwrap();
        assert_eq!(
            paths(&entries),
            vec!["items[0].a", "items[1].a", "items[2]"]
        );
        assert_eq!(entries[1].value, PropertyValue::Int(2));
    }

    #[test]
    fn null_values_yield_null_entries() {
        let doc = json!({ "a": null });
        let entries = flatten(&doc).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, PropertyValue::Null);
    }

    #[test]
    fn empty_containers_yield_no_entries() {
        let doc = json!({ "a": {}, "b": [], "c": 1 });
        let entries = flatten(&doc).unwrap();
        assert_eq!(paths(&entries), vec!["c"]);
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(matches!(
            flatten(&json!([1, 2])),
            Err(DocumentError::NotAnObject)
        ));
        assert!(matches!(
            flatten(&json!("scalar")),
            Err(DocumentError::NotAnObject)
        ));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let mut doc = json!(1);
        for _ in 0..(MAX_DEPTH + 4) {
            doc = json!({ "n": doc });
        }
        assert!(matches!(
            flatten(&doc),
            Err(DocumentError::DepthExceeded { .. })
        ));
    }

    #[test]
    fn flattening_is_deterministic() {
        let doc = json!({
            "root": {
                "meta": { "name": "A" },
                "props": { "text": "x", "width": 10.5 },
                "children": [ { "meta": { "name": "B" } } ]
            }
        });
        let first = flatten(&doc).unwrap();
        let second = flatten(&doc).unwrap();
        assert_eq!(first, second);
    }
}
