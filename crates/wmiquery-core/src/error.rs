//! Error types for the wmiquery decode pipeline.

use std::fmt;
use thiserror::Error;

/// Why a single field could not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchReason {
    /// The field is internal to the record and cannot be assigned.
    Unsettable,
    NoSuchProperty,
    NotInteger,
    NotNumeric,
    NotBoolean,
}

impl MismatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchReason::Unsettable => "unsettable field",
            MismatchReason::NoSuchProperty => "no such property",
            MismatchReason::NotInteger => "not an integer-compatible value",
            MismatchReason::NotNumeric => "not a numeric value",
            MismatchReason::NotBoolean => "not a boolean value",
        }
    }
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field could not be loaded into its record.
///
/// Apart from [`MismatchReason::Unsettable`], a mismatch leaves the field at
/// its zero value and does not stop the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("wmi: cannot load field {field:?} into a {record:?}: {reason}")]
pub struct FieldMismatch {
    /// Class name of the destination record.
    pub record: &'static str,
    pub field: &'static str,
    pub reason: MismatchReason,
}

/// Failures raised by a row source while counting rows, fetching a row or
/// resolving a property.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("row index {index} out of range ({count} rows)")]
    RowOutOfRange { index: u64, count: u64 },

    #[error("property {name:?} holds an unsupported {kind} value")]
    UnsupportedValue { name: String, kind: &'static str },

    /// The provider's own message, passed through unchanged.
    #[error("{0}")]
    Provider(String),
}

/// Errors returned by [`crate::loader::Loader`] and the `decode*` entry points.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("wmi: invalid entity type")]
    InvalidEntityType,

    #[error(transparent)]
    Unsettable(FieldMismatch),

    #[error("wmi: cannot parse {value:?} for field {field:?} of {record:?}: {source}")]
    ParseInt {
        record: &'static str,
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("wmi: invalid datetime {value:?} for field {field:?} of {record:?}: {reason}")]
    Timestamp {
        record: &'static str,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("wmi: unsupported {value} value for field {field:?} of {record:?}")]
    Unsupported {
        record: &'static str,
        field: &'static str,
        value: &'static str,
    },

    /// Recoverable: the batch completed but at least one field did not match.
    #[error(transparent)]
    FieldMismatch(FieldMismatch),

    /// Recoverable: every mismatch of the batch, in the order they occurred.
    #[error("wmi: {} field mismatches, last: {}", .0.len(), display_last(.0))]
    FieldMismatches(Vec<FieldMismatch>),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// The provider reported an error instead of a result set.
    #[error("{0}")]
    Provider(String),

    #[error("invalid response envelope: {0}")]
    Envelope(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A projected column is absent from a row.
    #[error("wmi: row {row} has no property {column:?}")]
    MissingColumn { row: u64, column: String },

    /// The thread that owns the provider is no longer running.
    #[error("wmi: worker unavailable: {0}")]
    Worker(String),
}

fn display_last(mismatches: &[FieldMismatch]) -> String {
    mismatches
        .last()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl QueryError {
    /// Returns `true` if the batch completed and the destination is usable,
    /// but incomplete for some fields.
    pub fn is_field_mismatch(&self) -> bool {
        matches!(self, Self::FieldMismatch(_) | Self::FieldMismatches(_))
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEntityType => "invalid_entity_type",
            Self::Unsettable(_) => "unsettable",
            Self::ParseInt { .. } => "parse_int",
            Self::Timestamp { .. } => "timestamp",
            Self::Unsupported { .. } => "unsupported",
            Self::FieldMismatch(_) | Self::FieldMismatches(_) => "field_mismatch",
            Self::Source(_) => "source",
            Self::Provider(_) => "provider",
            Self::Envelope(_) => "envelope",
            Self::Json(_) => "json",
            Self::MissingColumn { .. } => "missing_column",
            Self::Worker(_) => "worker",
        }
    }
}
