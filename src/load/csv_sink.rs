use crate::constants::CSV_SINK;
use crate::error::Result;
use crate::load::Sink;
use crate::types::Dataset;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Writes the dataset to a CSV file, replacing any existing file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, dataset: &Dataset) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(dataset.columns())?;
        for record in dataset {
            writer.write_record(record.to_text_row())?;
        }
        writer.flush()?;

        info!("Saved {} rows to CSV: {}", dataset.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl Sink for CsvSink {
    fn name(&self) -> &'static str {
        CSV_SINK
    }

    async fn load(&self, dataset: &Dataset) -> Result<()> {
        let sink = self.clone();
        let dataset = dataset.clone();
        tokio::task::spawn_blocking(move || sink.write(&dataset)).await?
    }
}
