//! Metrics for the ETL run
//!
//! Each pipeline phase owns a submodule with its own recording helpers, all
//! named through [`phase_metric!`] so names stay consistent:
//! `etl_{phase}_{metric_name}_total` for counters.

pub mod extract;
pub mod load;
pub mod transform;

pub use extract::ExtractMetrics;
pub use load::LoadMetrics;
pub use transform::TransformMetrics;

use std::sync::{Once, OnceLock};
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Idempotent.
///
/// The job is short-lived, so no HTTP listener is started; the snapshot is
/// read back in-process with [`render`].
pub fn init_metrics() {
    INIT.call_once(|| {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        match builder.install_recorder() {
            Ok(handle) => {
                if HANDLE.set(handle).is_err() {
                    warn!("Prometheus handle was already set");
                }
                extract::ExtractMetrics::register_metrics();
                transform::TransformMetrics::register_metrics();
                load::LoadMetrics::register_metrics();
                info!("Prometheus recorder installed");
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
            }
        }
    });
}

/// Prometheus text exposition of everything recorded so far.
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

/// Build a metric name for a phase.
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
