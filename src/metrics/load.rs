//! Load Phase Metrics
//!
//! Per-sink outcomes. Sinks are independent, so success and failure are
//! labelled by sink name.

use crate::metrics::phase_metric;

/// Metrics collection for the Load phase
pub struct LoadMetrics;

impl LoadMetrics {
    pub fn record_sink_success(sink: &'static str, rows: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "load", "sink_success"), "sink" => sink).increment(1);
        ::metrics::counter!(phase_metric!(counter, "load", "rows_written"), "sink" => sink)
            .increment(rows as u64);
        ::metrics::histogram!(phase_metric!(histogram, "load", "sink_duration_seconds"), "sink" => sink)
            .record(duration_secs);
    }

    pub fn record_sink_error(sink: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "load", "sink_errors"), "sink" => sink).increment(1);
    }

    pub fn register_metrics() {
        let _ = ::metrics::counter!(phase_metric!(counter, "load", "sink_success"));
        let _ = ::metrics::counter!(phase_metric!(counter, "load", "sink_errors"));
        let _ = ::metrics::counter!(phase_metric!(counter, "load", "rows_written"));
    }
}
