//! Decode metrics hook.
//!
//! The loader reports what it does through this trait. The default sink
//! discards everything; `wmiquery-observability` ships an OpenTelemetry
//! implementation.

use crate::error::MismatchReason;

pub trait DecodeMetrics: Send + Sync {
    /// A batch started with `rows` rows.
    fn record_batch(&self, record: &str, rows: u64);

    /// One record was appended to the destination.
    fn record_decoded(&self, record: &str);

    fn record_mismatch(&self, record: &str, reason: MismatchReason);

    /// The batch aborted. `error_type` is [`crate::QueryError::kind`].
    fn record_fatal(&self, record: &str, error_type: &str);
}

/// Discards every measurement.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl DecodeMetrics for NoopMetrics {
    fn record_batch(&self, _record: &str, _rows: u64) {}
    fn record_decoded(&self, _record: &str) {}
    fn record_mismatch(&self, _record: &str, _reason: MismatchReason) {}
    fn record_fatal(&self, _record: &str, _error_type: &str) {}
}
