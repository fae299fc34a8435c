//! Raw encoded descriptors and their classification.
//!
//! The encoded form is positional and loosely typed: which fields are present
//! decides what a descriptor is. Classification happens once, here, so the
//! rest of the crate only ever sees typed [`Node`]s.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::node::{Node, NodeIndex, NodeKind, ProfileId};

/// Top-level encoded document.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    #[serde(rename = "Version")]
    pub version: Option<Value>,
    #[serde(rename = "PublishDate")]
    pub publish_date: Option<Value>,
    #[serde(rename = "Data")]
    pub data: Option<Vec<Value>>,
}

/// One encoded node descriptor.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawDescriptor {
    /// Literal, or a list whose first element is the literal
    #[serde(default)]
    pub v: Option<Value>,
    /// `[min, max]`, possibly wrapped as `[[min, max]]`
    #[serde(default)]
    pub r: Option<Value>,
    /// Evidence key
    #[serde(default)]
    pub m: Option<String>,
    /// Profile id
    #[serde(default)]
    pub x: Option<Value>,
    /// Child indices
    #[serde(default)]
    pub n: Vec<NodeIndex>,
}

/// Descriptor shape, decided by field presence.
#[derive(Debug, PartialEq)]
pub(crate) enum Classified {
    Root,
    Value(String),
    Range(f64, f64),
    Malformed(&'static str),
}

impl RawDescriptor {
    pub fn parse(value: &Value) -> TreeResult<Self> {
        Self::deserialize(value)
            .map_err(|e| TreeError::malformed_descriptor(e.to_string(), value.to_string()))
    }

    pub fn classify(&self, index: NodeIndex) -> Classified {
        if index == 0 {
            return Classified::Root;
        }
        if let Some(v) = &self.v {
            if self.r.is_some() {
                debug!(index, "descriptor carries both literal and range, using literal");
            }
            return match literal_of(v) {
                Some(literal) => Classified::Value(literal),
                None => Classified::Malformed("literal must be a scalar or a non-empty list"),
            };
        }
        if let Some(r) = &self.r {
            return match range_of(r) {
                Some((min, max)) => Classified::Range(min, max),
                None => Classified::Malformed("range must be [min, max] of numbers"),
            };
        }
        Classified::Malformed("descriptor has neither a literal nor a range")
    }

    /// Missing or unparseable profile ids are absent, never an error.
    pub fn profile_id(&self) -> Option<ProfileId> {
        let parsed = match self.x.as_ref()? {
            Value::Number(n) => n.as_u64().and_then(|n| ProfileId::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<ProfileId>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            debug!(x = ?self.x, "ignoring unparseable profile id");
        }
        parsed
    }

    /// Build the typed node for this descriptor, children not yet linked.
    pub fn into_node(self, index: NodeIndex, source: &Value) -> TreeResult<(Node, Vec<NodeIndex>)> {
        let kind = match self.classify(index) {
            Classified::Root => NodeKind::Root,
            Classified::Value(literal) => NodeKind::Value(literal),
            Classified::Range(min, max) => NodeKind::Range { min, max },
            Classified::Malformed(reason) => {
                return Err(TreeError::malformed_descriptor(
                    format!("node {index}: {reason}"),
                    source.to_string(),
                ))
            }
        };
        let profile_id = self.profile_id();
        Ok((Node::new(index, kind, self.m, profile_id), self.n))
    }
}

fn literal_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        // same rendering as numeric evidence, so `5.0` reads as "5"
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.first().and_then(|first| match first {
            Value::Array(_) => None,
            other => literal_of(other),
        }),
        _ => None,
    }
}

fn range_of(r: &Value) -> Option<(f64, f64)> {
    let pair = match r.as_array()?.as_slice() {
        [Value::Array(inner)] => inner.as_slice(),
        flat => flat,
    };
    match pair {
        [min, max] => Some((min.as_f64()?, max.as_f64()?)),
        _ => None,
    }
}

/// Render a top-level scalar field as text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawDescriptor {
        RawDescriptor::parse(&value).unwrap()
    }

    #[test]
    fn given_index_zero_when_classifying_then_root_regardless_of_fields() {
        assert_eq!(raw(json!({"n": [1, 2]})).classify(0), Classified::Root);
        assert_eq!(raw(json!({"v": "a"})).classify(0), Classified::Root);
    }

    #[test]
    fn given_wrapped_literal_when_classifying_then_uses_first_element() {
        assert_eq!(
            raw(json!({"v": ["abc123", "ignored"]})).classify(3),
            Classified::Value("abc123".into())
        );
        assert_eq!(raw(json!({"v": 7})).classify(3), Classified::Value("7".into()));
    }

    #[test]
    fn given_fractional_number_literal_when_classifying_then_renders_like_evidence() {
        assert_eq!(raw(json!({"v": 5.0})).classify(1), Classified::Value("5".into()));
        assert_eq!(raw(json!({"v": [2.50]})).classify(1), Classified::Value("2.5".into()));
        assert_eq!(raw(json!({"v": 18446744073709551615u64})).classify(1), Classified::Value("18446744073709551615".into()));
    }

    #[test]
    fn given_wrapped_or_flat_range_when_classifying_then_both_accepted() {
        assert_eq!(raw(json!({"r": [[320, 480]]})).classify(1), Classified::Range(320.0, 480.0));
        assert_eq!(raw(json!({"r": [1.5, 2.5]})).classify(1), Classified::Range(1.5, 2.5));
    }

    #[test]
    fn given_bad_range_shape_when_classifying_then_malformed() {
        assert!(matches!(raw(json!({"r": [1]})).classify(1), Classified::Malformed(_)));
        assert!(matches!(raw(json!({"r": ["a", "b"]})).classify(1), Classified::Malformed(_)));
        assert!(matches!(raw(json!({"r": 5})).classify(1), Classified::Malformed(_)));
    }

    #[test]
    fn given_no_criterion_when_classifying_then_malformed() {
        let d = raw(json!({"m": "screenwidth", "x": 5, "n": [2]}));
        assert!(matches!(d.classify(1), Classified::Malformed(_)));
    }

    #[test]
    fn given_profile_ids_when_parsing_then_failures_become_absent() {
        assert_eq!(raw(json!({"x": 101})).profile_id(), Some(101));
        assert_eq!(raw(json!({"x": "205"})).profile_id(), Some(205));
        assert_eq!(raw(json!({"x": "iPhone"})).profile_id(), None);
        assert_eq!(raw(json!({"x": -1})).profile_id(), None);
        assert_eq!(raw(json!({"x": 1.5})).profile_id(), None);
        assert_eq!(raw(json!({})).profile_id(), None);
    }

    #[test]
    fn given_non_integer_children_when_parsing_then_malformed() {
        let err = RawDescriptor::parse(&json!({"v": "a", "n": ["one"]})).unwrap_err();
        assert!(err.is_malformed());
    }
}
