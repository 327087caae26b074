//! Extract Phase Metrics

use crate::metrics::phase_metric;

/// Metrics collection for the Extract phase
pub struct ExtractMetrics;

impl ExtractMetrics {
    /// Record a fetched and parsed catalog page
    pub fn record_page_success(cards: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "extract", "pages_fetched")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "extract", "cards_scraped")).increment(cards as u64);
        ::metrics::histogram!(phase_metric!(histogram, "extract", "page_duration_seconds"))
            .record(duration_secs);
    }

    pub fn record_page_error() {
        ::metrics::counter!(phase_metric!(counter, "extract", "page_errors")).increment(1);
    }

    pub fn register_metrics() {
        let _ = ::metrics::counter!(phase_metric!(counter, "extract", "pages_fetched"));
        let _ = ::metrics::counter!(phase_metric!(counter, "extract", "cards_scraped"));
        let _ = ::metrics::counter!(phase_metric!(counter, "extract", "page_errors"));
        let _ = ::metrics::histogram!(phase_metric!(histogram, "extract", "page_duration_seconds"));
    }
}
