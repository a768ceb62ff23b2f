//! # wmiquery-core
//!
//! Turns WMI query results into caller-defined records. A result set is any
//! [`RowSource`]; each row is decoded field by field into a [`Record`]
//! according to a fixed coercion table. Field-level problems are collected
//! and reported after the batch, while source failures abort it.

pub mod classes;
pub mod columns;
pub mod datetime;
pub mod decoder;
pub mod error;
pub mod json;
pub mod loader;
pub mod metrics;
pub mod query;
pub mod record;
pub mod shape;
pub mod source;
pub mod value;

pub use columns::{load_columns, ColumnRow};
pub use datetime::{format_wmi_datetime, parse_wmi_datetime, DatetimeError};
pub use decoder::RecordDecoder;
pub use error::{FieldMismatch, MismatchReason, QueryError, SourceError};
pub use json::{decode_json, Envelope, JsonRowSource};
pub use loader::{decode, Loader, MismatchMode};
pub use metrics::{DecodeMetrics, NoopMetrics};
pub use query::create_query;
pub use record::{FieldDescriptor, FieldKind, FieldValue, Record, RecordLayout, Slot};
pub use shape::{check_multi_arg, MultiArg, MultiArgType};
pub use source::{MemoryRow, MemoryRowSource, Row, RowSource};
pub use value::Value;
