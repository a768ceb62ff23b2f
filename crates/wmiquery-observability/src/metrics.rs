//! OpenTelemetry implementation of [`DecodeMetrics`].

use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use wmiquery_core::{DecodeMetrics, MismatchReason};

#[derive(Clone)]
pub struct OtelDecodeMetrics {
    pub rows_decoded: Counter<u64>,
    pub field_mismatches: Counter<u64>,
    pub fatal_errors: Counter<u64>,
    pub batch_size: Histogram<u64>,
}

impl OtelDecodeMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            rows_decoded: meter
                .u64_counter("wmiquery.rows_decoded")
                .with_description("Records appended to a destination")
                .build(),
            field_mismatches: meter
                .u64_counter("wmiquery.field_mismatches")
                .with_description("Fields left at their zero value")
                .build(),
            fatal_errors: meter
                .u64_counter("wmiquery.fatal_errors")
                .with_description("Batches aborted by a fatal decode or source error")
                .build(),
            batch_size: meter
                .u64_histogram("wmiquery.batch_size")
                .with_description("Rows reported by the source at the start of a batch")
                .build(),
        }
    }

    /// Instruments on the global meter provider.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("wmiquery"))
    }
}

impl DecodeMetrics for OtelDecodeMetrics {
    fn record_batch(&self, record: &str, rows: u64) {
        self.batch_size
            .record(rows, &[KeyValue::new("record", record.to_string())]);
    }

    fn record_decoded(&self, record: &str) {
        self.rows_decoded
            .add(1, &[KeyValue::new("record", record.to_string())]);
    }

    fn record_mismatch(&self, record: &str, reason: MismatchReason) {
        self.field_mismatches.add(
            1,
            &[
                KeyValue::new("record", record.to_string()),
                KeyValue::new("reason", reason.as_str()),
            ],
        );
    }

    fn record_fatal(&self, record: &str, error_type: &str) {
        self.fatal_errors.add(
            1,
            &[
                KeyValue::new("record", record.to_string()),
                KeyValue::new("error_type", error_type.to_string()),
            ],
        );
    }
}
