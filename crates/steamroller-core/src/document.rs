//! In-memory document tree for pipeline YAML.
//!
//! [`Value`] is a closed tagged union. Mappings keep insertion order so that
//! re-serialized pipelines stay close to the input, but equality between two
//! mappings ignores key order.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde::Deserialize;
use thiserror::Error;

/// Ordered string-keyed mapping.
pub type Mapping = IndexMap<String, Value>;

/// Document parse and emit errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    Parse { line: Option<usize>, message: String },

    #[error("unsupported mapping key: {key}")]
    UnsupportedKey { key: String },

    #[error("duplicate mapping key {key:?} after converting keys to strings")]
    DuplicateKey { key: String },

    #[error("failed to emit YAML: {message}")]
    Emit { message: String },
}

/// A parsed document node.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_yaml::Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Short name of the node type, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Look up `key` if this is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// String rendering of a scalar; `None` for sequences and mappings.
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl TryFrom<serde_yaml::Value> for Value {
    type Error = DocumentError;

    fn try_from(raw: serde_yaml::Value) -> Result<Self, Self::Error> {
        use serde_yaml::Value as Yaml;

        Ok(match raw {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::Number(n) => Value::Number(n),
            Yaml::String(s) => Value::String(s),
            Yaml::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Yaml::Mapping(entries) => {
                let mut map = Mapping::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = key_string(key)?;
                    if map.contains_key(&key) {
                        return Err(DocumentError::DuplicateKey { key });
                    }
                    map.insert(key, Value::try_from(value)?);
                }
                Value::Mapping(map)
            }
            // Tags carry no meaning for pipelines; keep the tagged value.
            Yaml::Tagged(tagged) => Value::try_from(tagged.value)?,
        })
    }
}

fn key_string(key: serde_yaml::Value) -> Result<String, DocumentError> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(DocumentError::UnsupportedKey {
            key: format!("{other:?}"),
        }),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Parse YAML bytes into a document tree.
///
/// Only the first document of a multi-document stream is read; an empty
/// stream is `Null`.
pub fn parse(bytes: &[u8]) -> Result<Value, DocumentError> {
    let raw = match serde_yaml::Deserializer::from_slice(bytes).next() {
        Some(document) => serde_yaml::Value::deserialize(document).map_err(parse_error)?,
        None => serde_yaml::Value::Null,
    };

    Value::try_from(raw)
}

fn parse_error(e: serde_yaml::Error) -> DocumentError {
    DocumentError::Parse {
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    }
}

/// Serialize a document tree back to YAML bytes.
pub fn serialize(value: &Value) -> Result<Vec<u8>, DocumentError> {
    serde_yaml::to_string(value)
        .map(String::into_bytes)
        .map_err(|e| DocumentError::Emit {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_key_order() {
        let doc = parse(b"zeta: 1\nalpha: 2\nmid: 3\n").unwrap();
        let keys: Vec<_> = doc.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_mapping_equality_ignores_order() {
        let a = parse(b"a: 1\nb: two\n").unwrap();
        let b = parse(b"b: two\na: 1\n").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_string_keys_are_rendered() {
        let doc = parse(b"1: one\ntrue: yes\n").unwrap();
        assert_eq!(doc.get("1"), Some(&Value::from("one")));
        assert_eq!(doc.get("true"), Some(&Value::from("yes")));
    }

    #[test]
    fn test_sequence_keys_are_rejected() {
        let result = parse(b"? [a, b]\n: value\n");
        assert!(matches!(result, Err(DocumentError::UnsupportedKey { .. })));
    }

    #[test]
    fn test_keys_colliding_after_rendering_are_rejected() {
        match parse(b"1: int-key\n\"1\": string-key\n") {
            Err(DocumentError::DuplicateKey { key }) => assert_eq!(key, "1"),
            other => panic!("Expected DuplicateKey, got {:?}", other),
        }
        assert!(matches!(
            parse(b"flags:\n  true: a\n  \"true\": b\n"),
            Err(DocumentError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_first_document_of_stream_is_used() {
        let doc = parse(b"jobs: []\n---\nother: 1\n").unwrap();
        assert_eq!(doc, parse(b"jobs: []\n").unwrap());
    }

    #[test]
    fn test_empty_input_is_null() {
        assert_eq!(parse(b"").unwrap(), Value::Null);
    }

    #[test]
    fn test_tags_are_dropped() {
        let doc = parse(b"value: !custom hello\n").unwrap();
        assert_eq!(doc.get("value"), Some(&Value::from("hello")));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let result = parse(b"jobs:\n  - name: a\n    plan: [unclosed\n");
        match result {
            Err(DocumentError::Parse { line, .. }) => assert!(line.is_some()),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_serialize_reparses_to_same_tree() {
        let source = br#"
jobs:
- name: build
  serial: true
  max_in_flight: 2
  plan:
  - get: repo
    trigger: true
  - task: unit
    config:
      platform: linux
      params: {RATIO: 0.5, EMPTY: ~}
"#;
        let doc = parse(source).unwrap();
        let emitted = serialize(&doc).unwrap();
        assert_eq!(parse(&emitted).unwrap(), doc);
    }

    #[test]
    fn test_scalar_string_rendering() {
        assert_eq!(Value::from("x").scalar_string(), Some("x".to_string()));
        assert_eq!(Value::Bool(false).scalar_string(), Some("false".to_string()));
        assert_eq!(Value::Null.scalar_string(), Some("null".to_string()));
        assert_eq!(Value::from(vec!["a"]).scalar_string(), None);
    }
}
