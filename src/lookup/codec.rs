//! Identifier codecs
//!
//! Each lookup owns one codec. `PlainIdCodec` passes identifiers through,
//! the UUID codecs expose canonical hyphenated text while storing either a
//! 16-byte binary value or a native UUID.

use uuid::Uuid;

use super::query::Predicate;
use super::traits::IdCodec;
use super::value::{LookupId, Value};
use crate::error::{LookupError, Result};

fn invalid(id: &LookupId, reason: impl Into<String>) -> LookupError {
    LookupError::InvalidId {
        id: id.to_string(),
        reason: reason.into(),
    }
}

fn stored(column: &str, reason: impl Into<String>) -> LookupError {
    LookupError::StoredId {
        column: column.to_string(),
        reason: reason.into(),
    }
}

fn parse_uuid(id: &LookupId) -> Result<Uuid> {
    match id {
        LookupId::Text(s) => Uuid::parse_str(s).map_err(|e| invalid(id, e.to_string())),
        _ => Err(invalid(id, "expected UUID text")),
    }
}

/// Identifiers used verbatim, text or integer
///
/// The column type is unknown, so ids are compared against the column's
/// text form: `"1"` and `1` both find an integer key `1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainIdCodec;

impl IdCodec for PlainIdCodec {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn encode(&self, id: &LookupId) -> Result<Value> {
        match id {
            LookupId::Null => Err(invalid(id, "null identifier")),
            LookupId::Int(v) => Ok(Value::Int(*v)),
            LookupId::Text(s) => Ok(Value::Text(s.clone())),
        }
    }

    fn decode(&self, column: &str, stored_value: &Value) -> Result<String> {
        match stored_value {
            Value::Null => Err(stored(column, "null identifier")),
            Value::Bytes(_) => Err(stored(
                column,
                "binary identifier needs a binary codec such as uuid_bytes",
            )),
            other => Ok(other.as_text()),
        }
    }

    fn filter(&self, column: &str, id: &LookupId) -> Result<Predicate> {
        Ok(Predicate::TextEquals {
            column: column.to_string(),
            value: self.encode(id)?.as_text(),
        })
    }
}

/// Integer keys; text input must parse as `i64`
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerIdCodec;

impl IdCodec for IntegerIdCodec {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn encode(&self, id: &LookupId) -> Result<Value> {
        match id {
            LookupId::Int(v) => Ok(Value::Int(*v)),
            LookupId::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| invalid(id, e.to_string())),
            LookupId::Null => Err(invalid(id, "null identifier")),
        }
    }

    fn decode(&self, column: &str, stored_value: &Value) -> Result<String> {
        match stored_value {
            Value::Int(v) => Ok(v.to_string()),
            other => Err(stored(column, format!("expected integer, got {other:?}"))),
        }
    }
}

/// UUIDs stored as 16-byte binary, exposed as canonical text
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidBytesCodec;

impl IdCodec for UuidBytesCodec {
    fn name(&self) -> &'static str {
        "uuid_bytes"
    }

    fn encode(&self, id: &LookupId) -> Result<Value> {
        Ok(Value::Bytes(parse_uuid(id)?.as_bytes().to_vec()))
    }

    fn decode(&self, column: &str, stored_value: &Value) -> Result<String> {
        match stored_value {
            Value::Bytes(bytes) => Uuid::from_slice(bytes)
                .map(|u| u.to_string())
                .map_err(|e| stored(column, e.to_string())),
            other => Err(stored(column, format!("expected 16 bytes, got {other:?}"))),
        }
    }
}

/// UUIDs stored in a native UUID column
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdCodec;

impl IdCodec for UuidIdCodec {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn encode(&self, id: &LookupId) -> Result<Value> {
        Ok(Value::Uuid(parse_uuid(id)?))
    }

    fn decode(&self, column: &str, stored_value: &Value) -> Result<String> {
        match stored_value {
            Value::Uuid(u) => Ok(u.to_string()),
            Value::Text(s) => Uuid::parse_str(s)
                .map(|u| u.to_string())
                .map_err(|e| stored(column, e.to_string())),
            other => Err(stored(column, format!("expected UUID, got {other:?}"))),
        }
    }
}
