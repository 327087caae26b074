//! Load: write a finished dataset to every configured destination.
//!
//! Sinks are independent. One failing never stops the others from being
//! attempted; the per-sink results come back in a [`LoadReport`].

pub mod csv_sink;
pub mod sheets;
pub mod sqlite_sink;

pub use csv_sink::CsvSink;
pub use sheets::{GoogleSheetsClient, SheetsApi, SheetsSink};
pub use sqlite_sink::SqliteSink;

use crate::config::Config;
use crate::error::Result;
use crate::metrics::LoadMetrics;
use crate::types::Dataset;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// A destination for a finished dataset. Loading replaces whatever the
/// destination held before.
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self, dataset: &Dataset) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkStatus {
    Succeeded,
    Failed(String),
}

impl SinkStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SinkStatus::Succeeded)
    }
}

/// Outcome of one load, in the order the sinks were attempted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub rows: usize,
    pub results: Vec<(&'static str, SinkStatus)>,
}

impl LoadReport {
    pub fn status(&self, sink: &str) -> Option<&SinkStatus> {
        self.results
            .iter()
            .find(|(name, _)| *name == sink)
            .map(|(_, status)| status)
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|(_, status)| status.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.results.iter().filter_map(|(name, status)| match status {
            SinkStatus::Failed(message) => Some((*name, message.as_str())),
            SinkStatus::Succeeded => None,
        })
    }
}

/// Write `dataset` to each sink in turn, collecting every outcome.
#[instrument(skip(dataset, sinks), fields(rows = dataset.len(), sinks = sinks.len()))]
pub async fn load_all(dataset: &Dataset, sinks: &[Box<dyn Sink>]) -> LoadReport {
    let mut report = LoadReport {
        rows: dataset.len(),
        results: Vec::with_capacity(sinks.len()),
    };

    for sink in sinks {
        let started = Instant::now();
        let status = match sink.load(dataset).await {
            Ok(()) => {
                LoadMetrics::record_sink_success(
                    sink.name(),
                    dataset.len(),
                    started.elapsed().as_secs_f64(),
                );
                info!(sink = sink.name(), "Sink loaded {} rows", dataset.len());
                SinkStatus::Succeeded
            }
            Err(e) => {
                LoadMetrics::record_sink_error(sink.name());
                error!(sink = sink.name(), "Sink failed: {}", e);
                SinkStatus::Failed(e.to_string())
            }
        };
        report.results.push((sink.name(), status));
    }

    report
}

/// Sinks enabled by `config`. CSV is always present; the spreadsheet and
/// relational sinks need their settings, and are skipped with a warning
/// otherwise.
pub fn build_sinks(config: &Config) -> Result<Vec<Box<dyn Sink>>> {
    let mut sinks: Vec<Box<dyn Sink>> = vec![Box::new(CsvSink::new(config.output_path.clone()))];

    match (&config.credentials_path, &config.sheet_url) {
        (Some(credentials), Some(url)) => {
            let client = GoogleSheetsClient::from_credentials(
                credentials,
                url,
                Duration::from_secs(config.request_timeout_secs),
            )?;
            sinks.push(Box::new(SheetsSink::new(client, &config.worksheet_name)));
        }
        _ => warn!("Google Sheets credentials or URL not set, skipping spreadsheet sink"),
    }

    match &config.database_uri {
        Some(uri) => sinks.push(Box::new(SqliteSink::new(uri, &config.table_name)?)),
        None => warn!("DATABASE_URI not set, skipping database sink"),
    }

    Ok(sinks)
}
