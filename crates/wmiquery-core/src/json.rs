//! JSON response envelopes.
//!
//! Remote agents return query results as
//! `{"Error": "...", "Response": [{"Name": "...", ...}, ...]}`. Each
//! element of `Response` is treated as a row whose properties are already
//! resolved, and runs through the same coercion rules as any other source.

use crate::error::{QueryError, SourceError};
use crate::loader::Loader;
use crate::record::Record;
use crate::source::{Row, RowSource};
use crate::value::Value;
use bytes::Buf;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::any::Any;

/// Size of the optional big-endian length prefix.
const PREFIX_LEN: usize = 4;

/// The response document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Error", alias = "error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "Response", alias = "response", default)]
    pub response: Option<Vec<Map<String, Json>>>,
}

impl Envelope {
    /// Parse either a whole document or a 4-byte big-endian length prefix
    /// followed by the document.
    pub fn from_slice(data: &[u8]) -> Result<Self, QueryError> {
        Ok(serde_json::from_slice(payload(data)?)?)
    }

    /// The provider-reported error, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    pub fn into_source(self) -> JsonRowSource {
        JsonRowSource::new(self.response.unwrap_or_default())
    }
}

fn payload(data: &[u8]) -> Result<&[u8], QueryError> {
    let first = data.iter().find(|b| !b.is_ascii_whitespace());
    if matches!(first, None | Some(b'{')) {
        return Ok(data);
    }
    if data.len() < PREFIX_LEN {
        return Err(QueryError::Envelope(format!(
            "{} bytes is too short for a length prefix",
            data.len()
        )));
    }
    let mut buf = data;
    let len = buf.get_u32() as usize;
    buf.get(..len).ok_or_else(|| {
        QueryError::Envelope(format!(
            "length prefix {len} exceeds the {} payload bytes",
            buf.len()
        ))
    })
}

/// Rows taken from a JSON envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonRowSource {
    rows: Vec<Map<String, Json>>,
}

impl JsonRowSource {
    pub fn new(rows: Vec<Map<String, Json>>) -> Self {
        Self { rows }
    }
}

impl RowSource for JsonRowSource {
    fn count(&self) -> Result<u64, SourceError> {
        Ok(self.rows.len() as u64)
    }

    fn row_at(&self, index: u64) -> Result<Box<dyn Row + '_>, SourceError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.rows.get(i))
            .map(|row| Box::new(JsonRow(row)) as Box<dyn Row + '_>)
            .ok_or(SourceError::RowOutOfRange {
                index,
                count: self.rows.len() as u64,
            })
    }
}

struct JsonRow<'a>(&'a Map<String, Json>);

impl Row for JsonRow<'_> {
    fn get_property(&self, name: &str) -> Result<Option<Value>, SourceError> {
        self.0.get(name).map(|v| json_value(name, v)).transpose()
    }
}

/// Integers without a fractional part become `Integer` (or
/// `UnsignedInteger` above `i64::MAX`); everything else numeric is `Float`.
fn json_value(name: &str, value: &Json) -> Result<Value, SourceError> {
    let unsupported = |kind| SourceError::UnsupportedValue {
        name: name.to_string(),
        kind,
    };
    match value {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::UnsignedInteger(u))
            } else {
                n.as_f64().map(Value::Float).ok_or_else(|| unsupported("number"))
            }
        }
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Array(_) => Err(unsupported("array")),
        Json::Object(_) => Err(unsupported("object")),
    }
}

impl Loader {
    /// Decode a JSON envelope into `dst`.
    ///
    /// A non-empty `Error` fails immediately with that message; no record
    /// is touched.
    pub fn load_json<R: Record>(&self, data: &[u8], dst: &mut dyn Any) -> Result<(), QueryError> {
        let envelope = Envelope::from_slice(data)?;
        if let Some(message) = envelope.error_message() {
            return Err(QueryError::Provider(message.to_string()));
        }
        self.load::<R>(&envelope.into_source(), dst)
    }
}

/// Decode a JSON envelope into `dst` with the default loader.
pub fn decode_json<R: Record>(data: &[u8], dst: &mut dyn Any) -> Result<(), QueryError> {
    Loader::default().load_json::<R>(data, dst)
}
