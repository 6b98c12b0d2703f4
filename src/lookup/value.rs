//! Column values, rows and identifier inputs

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::query::strip_alias;

/// A single column value as read from (or bound to) a data source
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text used for labels and in-process matching; `NULL` renders empty
    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Ascending comparison with `NULL` sorted last, matching Postgres
    /// default `ASC` ordering.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (a, b) => a.as_text().cmp(&b.as_text()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) => f.write_str(&String::from_utf8_lossy(v)),
            Value::Uuid(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A row returned by a data source, in projection order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Get a column value; alias prefixes on `column` are ignored
    pub fn get(&self, column: &str) -> Option<&Value> {
        let name = strip_alias(column);
        self.columns
            .iter()
            .find(|(c, _)| c == name)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// An identifier handed to `lookup_by_id` / `has_id`
///
/// Mirrors what a form field can hold: nothing, an integer key or a string
/// key (plain or canonical UUID text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LookupId {
    Null,
    Int(i64),
    Text(String),
}

impl LookupId {
    /// Blank identifiers never reach the data source.
    ///
    /// `Null`, `0`, `""` and `"0"` are blank.
    pub fn is_blank(&self) -> bool {
        match self {
            LookupId::Null => true,
            LookupId::Int(v) => *v == 0,
            LookupId::Text(s) => s.is_empty() || s == "0",
        }
    }
}

impl fmt::Display for LookupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupId::Null => f.write_str("null"),
            LookupId::Int(v) => write!(f, "{v}"),
            LookupId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for LookupId {
    fn from(v: &str) -> Self {
        LookupId::Text(v.to_string())
    }
}

impl From<String> for LookupId {
    fn from(v: String) -> Self {
        LookupId::Text(v)
    }
}

impl From<i64> for LookupId {
    fn from(v: i64) -> Self {
        LookupId::Int(v)
    }
}

impl<T: Into<LookupId>> From<Option<T>> for LookupId {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(LookupId::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_ids() {
        assert!(LookupId::Null.is_blank());
        assert!(LookupId::Int(0).is_blank());
        assert!(LookupId::from("").is_blank());
        assert!(LookupId::from("0").is_blank());
        assert!(LookupId::from(None::<i64>).is_blank());

        assert!(!LookupId::Int(7).is_blank());
        assert!(!LookupId::from("00").is_blank());
        assert!(!LookupId::from("alpha").is_blank());
    }

    #[test]
    fn test_lookup_id_from_json() {
        let ids: Vec<LookupId> = serde_json::from_str(r#"[null, 42, "abc"]"#).unwrap();
        assert_eq!(
            ids,
            vec![
                LookupId::Null,
                LookupId::Int(42),
                LookupId::Text("abc".to_string())
            ]
        );
    }

    #[test]
    fn test_row_get_strips_alias() {
        let row = Row::new().with("id", 1i64).with("name", "alpha");
        assert_eq!(row.get("h.name"), Some(&Value::from("alpha")));
        assert_eq!(row.get("id"), Some(&Value::Int(1)));
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_null_sorts_last() {
        let mut values = vec![Value::Null, Value::from("b"), Value::from("a")];
        values.sort_by(|a, b| a.compare(b));
        assert_eq!(values, vec![Value::from("a"), Value::from("b"), Value::Null]);
    }

    #[test]
    fn test_null_renders_empty() {
        assert_eq!(Value::Null.as_text(), "");
        assert_eq!(Value::Int(12).as_text(), "12");
    }
}
