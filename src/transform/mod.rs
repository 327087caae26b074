//! Transform stage: raw scraped cards in, deduplicated typed dataset out.
//!
//! Order of operations for one batch:
//! 1. drop records carrying a sentinel value ([`filter`])
//! 2. parse each field independently ([`parsers`], [`transformer`])
//! 3. drop rows with a missing field, stamp the batch timestamp, remove
//!    duplicates and check the output schema ([`finalize`])
//!
//! Field-level problems never surface as errors; they become missing values
//! and the row is dropped. The only batch-level signal is
//! [`BatchOutcome::Empty`].

pub mod filter;
pub mod finalize;
pub mod parsers;
pub mod transformer;

pub use filter::{filter_valid, is_sentinel_record};
pub use parsers::FieldError;
pub use transformer::RecordTransformer;

use crate::config::Config;
use crate::metrics::TransformMetrics;
use crate::types::{BatchOutcome, Dataset, EmptyReason, RawRecord};
use transformer::FieldFailures;
use tracing::{info, instrument, warn};

/// Row counts at each stage of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformStats {
    pub input_rows: usize,
    pub sentinel_rows: usize,
    pub field_failures: FieldFailures,
    pub incomplete_rows: usize,
    pub duplicate_rows: usize,
    pub schema_rejected_rows: usize,
    pub output_rows: usize,
}

impl TransformStats {
    fn record(&self) {
        TransformMetrics::record_sentinel_rows(self.sentinel_rows);
        TransformMetrics::record_incomplete_rows(self.incomplete_rows);
        TransformMetrics::record_duplicate_rows(self.duplicate_rows);
        TransformMetrics::record_schema_rejections(self.schema_rejected_rows);
        TransformMetrics::record_output_rows(self.output_rows);
    }
}

/// Transform one batch of raw records using the configured exchange rate.
pub fn transform_batch(records: Vec<RawRecord>, config: &Config) -> BatchOutcome {
    run_batch(records, &RecordTransformer::new(config.exchange_rate)).0
}

#[instrument(skip(records, transformer), fields(rows = records.len(), exchange_rate = transformer.exchange_rate()))]
pub(crate) fn run_batch(
    records: Vec<RawRecord>,
    transformer: &RecordTransformer,
) -> (BatchOutcome, TransformStats) {
    let mut stats = TransformStats {
        input_rows: records.len(),
        ..Default::default()
    };
    TransformMetrics::record_input_rows(stats.input_rows);

    if records.is_empty() {
        warn!("Transform received an empty batch");
        return (BatchOutcome::Empty(EmptyReason::NoRawRecords), stats);
    }

    // Captured once so every row of the batch shares it
    let collected_at = finalize::batch_timestamp(&records);

    let (valid, sentinel_rows) = filter_valid(records);
    stats.sentinel_rows = sentinel_rows;
    info!(kept = valid.len(), excluded = sentinel_rows, "Sentinel values filtered");

    let (candidates, field_failures) = transformer.transform_records(&valid);
    stats.field_failures = field_failures;

    let (complete, incomplete_rows) = finalize::drop_incomplete(candidates, collected_at);
    stats.incomplete_rows = incomplete_rows;

    let (unique, duplicate_rows) = finalize::dedup(complete);
    stats.duplicate_rows = duplicate_rows;

    let (rows, schema_rejected_rows) = finalize::enforce_schema(unique);
    stats.schema_rejected_rows = schema_rejected_rows;
    stats.output_rows = rows.len();
    stats.record();

    info!(
        input = stats.input_rows,
        sentinel = stats.sentinel_rows,
        incomplete = stats.incomplete_rows,
        duplicates = stats.duplicate_rows,
        rejected = stats.schema_rejected_rows,
        output = stats.output_rows,
        "Transform finished"
    );

    if rows.is_empty() {
        warn!("Every row was dropped during transform");
        return (BatchOutcome::Empty(EmptyReason::AllRowsDropped), stats);
    }

    (BatchOutcome::Ready(Dataset::new(rows)), stats)
}
