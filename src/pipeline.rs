use crate::config::Config;
use crate::error::Result;
use crate::extract::CatalogSource;
use crate::load::{load_all, LoadReport, Sink};
use crate::transform::{run_batch, RecordTransformer, TransformStats};
use crate::types::{BatchOutcome, EmptyReason, RawRecord};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// A dataset was produced and every sink was attempted.
    Completed(LoadReport),
    /// Nothing to load; no sink was called.
    Halted(EmptyReason),
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub source: &'static str,
    pub stats: TransformStats,
    pub outcome: PipelineOutcome,
    pub duration_secs: f64,
}

/// Short summary suitable for printing or logging as JSON.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub source: String,
    pub raw_rows: usize,
    pub output_rows: usize,
    pub halted: Option<String>,
    pub failed_sinks: Vec<String>,
}

impl PipelineResult {
    pub fn is_halted(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Halted(_))
    }

    pub fn load_report(&self) -> Option<&LoadReport> {
        match &self.outcome {
            PipelineOutcome::Completed(report) => Some(report),
            PipelineOutcome::Halted(_) => None,
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id.to_string(),
            source: self.source.to_string(),
            raw_rows: self.stats.input_rows,
            output_rows: self.stats.output_rows,
            halted: match &self.outcome {
                PipelineOutcome::Halted(reason) => Some(reason.to_string()),
                PipelineOutcome::Completed(_) => None,
            },
            failed_sinks: self
                .load_report()
                .map(|r| r.failures().map(|(name, _)| name.to_string()).collect())
                .unwrap_or_default(),
        }
    }
}

pub struct Pipeline;

impl Pipeline {
    /// Extract from `source`, transform, then load into every sink.
    ///
    /// Extraction errors abort the run. An empty transform result halts it
    /// before any sink is touched.
    #[instrument(skip_all, fields(source = source.source_name()))]
    pub async fn run(
        config: &Config,
        source: &dyn CatalogSource,
        sinks: &[Box<dyn Sink>],
    ) -> Result<PipelineResult> {
        info!("Starting extraction");
        let records = source.fetch_records().await?;
        Ok(Self::run_records(config, source.source_name(), records, sinks).await)
    }

    /// Transform and load records that were already extracted.
    #[instrument(skip(config, records, sinks), fields(run_id = tracing::field::Empty))]
    pub async fn run_records(
        config: &Config,
        source: &'static str,
        records: Vec<RawRecord>,
        sinks: &[Box<dyn Sink>],
    ) -> PipelineResult {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let started = Instant::now();

        let transformer = RecordTransformer::new(config.exchange_rate);
        let (batch, stats) = run_batch(records, &transformer);

        let outcome = match batch {
            BatchOutcome::Empty(reason) => {
                warn!("Pipeline halted: {}", reason);
                PipelineOutcome::Halted(reason)
            }
            BatchOutcome::Ready(dataset) => {
                info!("Loading {} rows into {} sinks", dataset.len(), sinks.len());
                let report = load_all(&dataset, sinks).await;
                PipelineOutcome::Completed(report)
            }
        };

        let duration_secs = started.elapsed().as_secs_f64();
        info!(duration_secs, "Pipeline finished");

        PipelineResult {
            run_id,
            source,
            stats,
            outcome,
            duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::load::SinkStatus;
    use crate::types::Dataset;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct StaticSource(Vec<RawRecord>);

    #[async_trait]
    impl CatalogSource for StaticSource {
        fn source_name(&self) -> &'static str {
            "static"
        }

        async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl CatalogSource for BrokenSource {
        fn source_name(&self) -> &'static str {
            "broken"
        }

        async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
            Err(EtlError::Api {
                message: "503 Service Unavailable".into(),
            })
        }
    }

    struct MemorySink(Arc<Mutex<Vec<Dataset>>>);

    #[async_trait]
    impl Sink for MemorySink {
        fn name(&self) -> &'static str {
            "memory"
        }

        async fn load(&self, dataset: &Dataset) -> Result<()> {
            self.0.lock().unwrap().push(dataset.clone());
            Ok(())
        }
    }

    fn memory_sink() -> (Arc<Mutex<Vec<Dataset>>>, Vec<Box<dyn Sink>>) {
        let loads = Arc::new(Mutex::new(Vec::new()));
        let sinks: Vec<Box<dyn Sink>> = vec![Box::new(MemorySink(loads.clone()))];
        (loads, sinks)
    }

    #[tokio::test]
    async fn test_full_run_loads_dataset() {
        let (loads, sinks) = memory_sink();
        let source = StaticSource(vec![RawRecord::new(
            "T-shirt 2",
            "$102.15",
            "Rating: ⭐ 3.9 / 5",
            "3 Colors",
            "Size: M",
            "Gender: Women",
        )]);

        let result = Pipeline::run(&Config::new(16000.0), &source, &sinks).await.unwrap();

        assert!(!result.is_halted());
        assert_eq!(result.source, "static");
        let report = result.load_report().unwrap();
        assert_eq!(report.status("memory"), Some(&SinkStatus::Succeeded));
        assert_eq!(loads.lock().unwrap()[0].len(), 1);
        assert!(result.summary().failed_sinks.is_empty());
    }

    #[tokio::test]
    async fn test_empty_source_halts_before_load() {
        let (loads, sinks) = memory_sink();
        let result = Pipeline::run(&Config::new(16000.0), &StaticSource(Vec::new()), &sinks)
            .await
            .unwrap();

        assert_eq!(result.outcome, PipelineOutcome::Halted(EmptyReason::NoRawRecords));
        assert!(loads.lock().unwrap().is_empty());
        assert!(result.summary().halted.is_some());
    }

    #[tokio::test]
    async fn test_extraction_error_aborts() {
        let (loads, sinks) = memory_sink();
        let result = Pipeline::run(&Config::new(16000.0), &BrokenSource, &sinks).await;
        assert!(matches!(result, Err(EtlError::Api { .. })));
        assert!(loads.lock().unwrap().is_empty());
    }
}
