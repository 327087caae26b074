use crate::error::Result;
use crate::extract::CatalogSource;
use crate::types::RawRecord;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Raw records previously saved with [`write_raw_dump`].
pub struct RawDumpSource {
    path: PathBuf,
}

impl RawDumpSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for RawDumpSource {
    fn source_name(&self) -> &'static str {
        "raw_dump"
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        read_raw_dump(&self.path)
    }
}

pub fn read_raw_dump(path: &Path) -> Result<Vec<RawRecord>> {
    let content = fs::read_to_string(path)?;
    let records: Vec<RawRecord> = serde_json::from_str(&content)?;
    info!("Read {} raw records from {}", records.len(), path.display());
    Ok(records)
}

pub fn write_raw_dump(path: &Path, records: &[RawRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    info!("Wrote {} raw records to {}", records.len(), path.display());
    Ok(())
}
