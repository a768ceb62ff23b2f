//! # wmiquery-observability
//!
//! ## Metrics
//! - `wmiquery.rows_decoded`     counter, tagged with record
//! - `wmiquery.field_mismatches` counter, tagged with record + reason
//! - `wmiquery.fatal_errors`     counter, tagged with record + error_type
//! - `wmiquery.batch_size`       histogram, tagged with record
//!
//! ## Logging
//! Text or JSON logs through `tracing-subscriber`, with per-component levels.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::OtelDecodeMetrics;
pub use tracing_setup::{init_tracing, LogConfig, LogFormat};
