//! `Loader` — drives the record decoder over a whole result set.

use crate::decoder::RecordDecoder;
use crate::error::{FieldMismatch, QueryError};
use crate::metrics::{DecodeMetrics, NoopMetrics};
use crate::record::Record;
use crate::shape::{check_multi_arg, MultiArg};
use crate::source::RowSource;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Controls how the loader reports field mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchMode {
    /// Keep loading; return only the last mismatch of the batch.
    #[default]
    Last,
    /// Keep loading; return every mismatch of the batch.
    Collect,
    /// Abort on the first mismatch. The offending row is not appended.
    Throw,
}

/// Batch loader. Cheap to clone.
#[derive(Clone)]
pub struct Loader {
    decoder: RecordDecoder,
    mode: MismatchMode,
    metrics: Arc<dyn DecodeMetrics>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader").field("mode", &self.mode).finish()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            decoder: RecordDecoder::new(),
            mode: MismatchMode::default(),
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn mode(mut self, mode: MismatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn DecodeMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Load every row of `source` into `dst`, which must be a `Vec<R>` or a
    /// `Vec<Box<R>>`.
    ///
    /// Records are appended in row order. A fatal error stops the batch and
    /// leaves already appended records in place. Field mismatches do not stop
    /// the batch; they are reported once it completes, per [`MismatchMode`].
    pub fn load<R: Record>(
        &self,
        source: &dyn RowSource,
        dst: &mut dyn Any,
    ) -> Result<(), QueryError> {
        let mut target = check_multi_arg::<R>(dst);
        if let MultiArg::Invalid = target {
            return Err(QueryError::InvalidEntityType);
        }

        let class = R::layout().name();
        let count = source.count().map_err(|e| self.fatal(class, e.into()))?;
        self.metrics.record_batch(class, count);
        info!(record = class, rows = count, mode = ?self.mode, "loading batch");

        let mut last: Option<FieldMismatch> = None;
        let mut collected: Vec<FieldMismatch> = Vec::new();

        for index in 0..count {
            let row = source
                .row_at(index)
                .map_err(|e| self.fatal(class, e.into()))?;

            let mut record = R::default();
            let mismatches = self
                .decoder
                .decode_fields(row.as_ref(), &mut record)
                .map_err(|e| self.fatal(class, e))?;

            for mismatch in &mismatches {
                debug!(row = index, field = mismatch.field, reason = %mismatch.reason, "field mismatch");
                self.metrics.record_mismatch(class, mismatch.reason);
            }

            if self.mode == MismatchMode::Throw {
                if let Some(first) = mismatches.into_iter().next() {
                    warn!(row = index, "{first}");
                    return Err(QueryError::FieldMismatch(first));
                }
            } else if let Some(latest) = mismatches.last() {
                last = Some(latest.clone());
                if self.mode == MismatchMode::Collect {
                    collected.extend(mismatches);
                }
            }

            target.push(record);
            self.metrics.record_decoded(class);
        }

        match (self.mode, last) {
            (MismatchMode::Collect, Some(_)) => {
                info!(record = class, mismatches = collected.len(), "batch loaded with mismatches");
                Err(QueryError::FieldMismatches(collected))
            }
            (_, Some(mismatch)) => {
                info!(record = class, "batch loaded, last mismatch: {mismatch}");
                Err(QueryError::FieldMismatch(mismatch))
            }
            (_, None) => {
                info!(record = class, rows = count, "batch loaded");
                Ok(())
            }
        }
    }

    fn fatal(&self, class: &str, err: QueryError) -> QueryError {
        warn!(record = class, error = %err, "batch aborted");
        self.metrics.record_fatal(class, err.kind());
        err
    }
}

/// Load `source` into `dst` with the default loader.
pub fn decode<R: Record>(source: &dyn RowSource, dst: &mut dyn Any) -> Result<(), QueryError> {
    Loader::default().load::<R>(source, dst)
}
