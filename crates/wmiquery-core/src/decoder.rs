//! `RecordDecoder` — maps one row onto one freshly allocated record.
//!
//! Fields are visited in declaration order. Each property is coerced into
//! its field according to the value tag:
//!
//! | value            | accepted fields                         | otherwise          |
//! |------------------|-----------------------------------------|--------------------|
//! | integer/unsigned | any integer (narrowed / reinterpreted)  | mismatch           |
//! | float            | integers (truncated), floats            | mismatch           |
//! | string           | string, integers (parsed), timestamp    | fatal              |
//! | timestamp        | timestamp (parsed), string (raw)        | fatal              |
//! | boolean          | bool                                    | mismatch           |
//! | null             | optional fields (left at zero)          | fatal              |
//!
//! A missing property is a mismatch; it never aborts the record.

use crate::datetime::parse_wmi_datetime;
use crate::error::{FieldMismatch, MismatchReason, QueryError};
use crate::record::{FieldKind, Record, Slot};
use crate::source::Row;
use crate::value::Value;

/// Stateless per-row decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordDecoder;

impl RecordDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode `row` into `record`, returning the last recoverable mismatch.
    pub fn decode<R: Record>(
        &self,
        row: &dyn Row,
        record: &mut R,
    ) -> Result<Option<FieldMismatch>, QueryError> {
        Ok(self.decode_fields(row, record)?.pop())
    }

    /// Decode `row` into `record`, returning every recoverable mismatch in
    /// field order.
    pub fn decode_fields<R: Record>(
        &self,
        row: &dyn Row,
        record: &mut R,
    ) -> Result<Vec<FieldMismatch>, QueryError> {
        let layout = R::layout();
        let mut mismatches = Vec::new();

        for (index, field) in layout.fields().iter().enumerate() {
            let mismatch = |reason| FieldMismatch {
                record: layout.name(),
                field: field.name,
                reason,
            };
            if !field.settable {
                return Err(QueryError::Unsettable(mismatch(MismatchReason::Unsettable)));
            }
            let Some(slot) = record.slot(index) else {
                return Err(QueryError::Unsettable(mismatch(MismatchReason::Unsettable)));
            };

            let value = match row.get_property(field.name)? {
                Some(value) => value,
                None => {
                    mismatches.push(mismatch(MismatchReason::NoSuchProperty));
                    continue;
                }
            };

            match coerce(slot, value, field.optional) {
                Ok(None) => {}
                Ok(Some(reason)) => mismatches.push(mismatch(reason)),
                Err(err) => return Err(err.into_query_error(layout.name(), field.name)),
            }
        }

        Ok(mismatches)
    }
}

/// Fatal coercion failures, before record/field context is attached.
#[derive(Debug)]
enum CoerceError {
    ParseInt {
        value: String,
        source: std::num::ParseIntError,
    },
    Timestamp {
        value: String,
        reason: String,
    },
    Unsupported(&'static str),
}

impl CoerceError {
    fn into_query_error(self, record: &'static str, field: &'static str) -> QueryError {
        match self {
            CoerceError::ParseInt { value, source } => QueryError::ParseInt {
                record,
                field,
                value,
                source,
            },
            CoerceError::Timestamp { value, reason } => QueryError::Timestamp {
                record,
                field,
                value,
                reason,
            },
            CoerceError::Unsupported(value) => QueryError::Unsupported {
                record,
                field,
                value,
            },
        }
    }
}

/// Apply one value to one slot. `Ok(Some(_))` is a recoverable mismatch.
fn coerce(
    slot: Slot<'_>,
    value: Value,
    optional: bool,
) -> Result<Option<MismatchReason>, CoerceError> {
    match value {
        Value::Integer(v) => Ok((!slot.set_signed(v)).then_some(MismatchReason::NotInteger)),
        Value::UnsignedInteger(v) => {
            Ok((!slot.set_unsigned(v)).then_some(MismatchReason::NotInteger))
        }
        Value::Float(v) => match slot {
            Slot::F32(f) => {
                *f = v as f32;
                Ok(None)
            }
            Slot::F64(f) => {
                *f = v;
                Ok(None)
            }
            slot => match slot.kind() {
                // `as` truncates toward zero and saturates at the target range.
                FieldKind::Int(_) => {
                    slot.set_signed(v as i64);
                    Ok(None)
                }
                FieldKind::Uint(_) => {
                    slot.set_unsigned(v as u64);
                    Ok(None)
                }
                _ => Ok(Some(MismatchReason::NotNumeric)),
            },
        },
        Value::String(s) => match slot {
            Slot::Str(f) => {
                *f = s;
                Ok(None)
            }
            Slot::Timestamp(f) => {
                *f = parse_timestamp(s)?;
                Ok(None)
            }
            slot => match slot.kind() {
                FieldKind::Int(_) => {
                    let n = s
                        .parse::<i64>()
                        .map_err(|source| CoerceError::ParseInt { value: s, source })?;
                    slot.set_signed(n);
                    Ok(None)
                }
                FieldKind::Uint(_) => {
                    slot.set_unsigned(parse_unsigned(s)?);
                    Ok(None)
                }
                _ => Err(CoerceError::Unsupported("string")),
            },
        },
        Value::Timestamp(raw) => match slot {
            Slot::Timestamp(f) => {
                *f = parse_timestamp(raw)?;
                Ok(None)
            }
            Slot::Str(f) => {
                *f = raw;
                Ok(None)
            }
            _ => Err(CoerceError::Unsupported("timestamp")),
        },
        Value::Boolean(b) => match slot {
            Slot::Bool(f) => {
                *f = b;
                Ok(None)
            }
            _ => Ok(Some(MismatchReason::NotBoolean)),
        },
        // The optional's inner value was already allocated at zero.
        Value::Null if optional => Ok(None),
        Value::Null => Err(CoerceError::Unsupported("null")),
    }
}

/// Base-10 signed parse, reinterpreted as unsigned. Counters above
/// `i64::MAX` arrive as strings too, so those are accepted as `u64`.
fn parse_unsigned(s: String) -> Result<u64, CoerceError> {
    match s.parse::<i64>() {
        Ok(n) => Ok(n as u64),
        Err(source) => s
            .parse::<u64>()
            .map_err(|_| CoerceError::ParseInt { value: s, source }),
    }
}

fn parse_timestamp(
    raw: String,
) -> Result<chrono::DateTime<chrono::FixedOffset>, CoerceError> {
    parse_wmi_datetime(&raw).map_err(|e| CoerceError::Timestamp {
        reason: e.to_string(),
        value: raw,
    })
}
