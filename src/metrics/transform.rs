//! Transform Phase Metrics
//!
//! Row counts at each cleaning stage so dropped rows are visible outside the
//! logs.

use crate::metrics::phase_metric;
use crate::types::Column;

/// Metrics collection for the Transform phase
pub struct TransformMetrics;

impl TransformMetrics {
    pub fn record_input_rows(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "batches")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "transform", "input_rows")).increment(rows as u64);
    }

    pub fn record_sentinel_rows(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "sentinel_rows"))
            .increment(rows as u64);
    }

    /// One field on one row could not be parsed.
    pub fn record_field_failure(column: Column) {
        ::metrics::counter!(
            phase_metric!(counter, "transform", "field_failures"),
            "column" => column.as_str()
        )
        .increment(1);
    }

    /// A column could not be transformed for any row in the batch.
    pub fn record_column_degraded(column: Column) {
        ::metrics::counter!(
            phase_metric!(counter, "transform", "columns_degraded"),
            "column" => column.as_str()
        )
        .increment(1);
    }

    pub fn record_incomplete_rows(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "incomplete_rows"))
            .increment(rows as u64);
    }

    pub fn record_duplicate_rows(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "duplicate_rows"))
            .increment(rows as u64);
    }

    pub fn record_schema_rejections(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "schema_rejected_rows"))
            .increment(rows as u64);
    }

    pub fn record_output_rows(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "output_rows")).increment(rows as u64);
        ::metrics::gauge!(phase_metric!(gauge, "transform", "last_batch_rows")).set(rows as f64);
    }

    pub fn register_metrics() {
        let _ = ::metrics::counter!(phase_metric!(counter, "transform", "batches"));
        let _ = ::metrics::counter!(phase_metric!(counter, "transform", "input_rows"));
        let _ = ::metrics::counter!(phase_metric!(counter, "transform", "sentinel_rows"));
        let _ = ::metrics::counter!(phase_metric!(counter, "transform", "incomplete_rows"));
        let _ = ::metrics::counter!(phase_metric!(counter, "transform", "duplicate_rows"));
        let _ = ::metrics::counter!(phase_metric!(counter, "transform", "schema_rejected_rows"));
        let _ = ::metrics::counter!(phase_metric!(counter, "transform", "output_rows"));
        let _ = ::metrics::gauge!(phase_metric!(gauge, "transform", "last_batch_rows"));
    }
}
