//! Property values as delivered by a row source.
//!
//! Providers hand back loosely-typed variants. Every property read is
//! normalized into a [`Value`] before the decoder looks at it, so the
//! coercion rules only ever see this closed set of tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single decoded scalar read from a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Integer(i64),
    UnsignedInteger(u64),
    Float(f64),
    String(String),
    Boolean(bool),
    /// Raw WMI datetime text, e.g. `20230615093045.123456-0500`.
    Timestamp(String),
    Null,
}

impl Value {
    /// Returns `true` if the property existed but carried no value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short tag name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::UnsignedInteger(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Timestamp(_) => "timestamp",
            Value::Null => "null",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Timestamp(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::UnsignedInteger(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Timestamp(s) => write!(f, "{s}"),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UnsignedInteger(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UnsignedInteger(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        assert_eq!(Value::Integer(1).kind(), "integer");
        assert_eq!(Value::Timestamp("x".into()).kind(), "timestamp");
        assert_eq!(Value::from(None::<bool>).kind(), "null");
    }

    #[test]
    fn tagged_serde_shape() {
        let json = serde_json::to_value(Value::from(42u32)).unwrap();
        assert_eq!(json["type"], "unsigned_integer");
        assert_eq!(json["value"], 42);
    }
}
