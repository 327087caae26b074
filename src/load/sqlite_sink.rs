use crate::constants::SQLITE_SINK;
use crate::error::{EtlError, Result};
use crate::load::Sink;
use crate::types::Dataset;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tracing::info;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Replaces the contents of one SQLite table with the dataset.
///
/// The table is dropped and recreated inside a single transaction, so a
/// failed load leaves the previous contents in place.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    db_path: PathBuf,
    table_name: String,
}

impl SqliteSink {
    /// `database_uri` is either a plain file path or `sqlite://<path>`.
    pub fn new(database_uri: &str, table_name: &str) -> Result<Self> {
        if !IDENTIFIER_RE.is_match(table_name) {
            return Err(EtlError::Config(format!(
                "table name '{table_name}' must be a plain SQL identifier"
            )));
        }
        Ok(Self {
            db_path: database_path(database_uri)?,
            table_name: table_name.to_string(),
        })
    }

    pub fn write(&self, dataset: &Dataset) -> Result<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(&self.db_path)?;
        let tx = conn.transaction()?;

        tx.execute_batch(&format!(
            r#"
            DROP TABLE IF EXISTS {table};
            CREATE TABLE {table} (
                title        TEXT    NOT NULL,
                price        REAL    NOT NULL,
                rating       REAL    NOT NULL,
                colors       INTEGER NOT NULL,
                size         TEXT    NOT NULL,
                gender       TEXT    NOT NULL,
                collected_at TEXT    NOT NULL
            );
            "#,
            table = self.table_name
        ))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (title, price, rating, colors, size, gender, collected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                self.table_name
            ))?;
            for record in dataset {
                stmt.execute(params![
                    record.title,
                    record.price,
                    record.rating,
                    record.colors,
                    record.size,
                    record.gender,
                    record.collected_at_text(),
                ])?;
            }
        }

        tx.commit()?;
        info!(
            "Saved {} rows to SQLite table {} in {}",
            dataset.len(),
            self.table_name,
            self.db_path.display()
        );
        Ok(())
    }
}

fn database_path(database_uri: &str) -> Result<PathBuf> {
    let trimmed = database_uri.trim();
    let path = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);

    if path.is_empty() {
        return Err(EtlError::Config("database_uri has no path".to_string()));
    }
    if trimmed.contains("://") && !trimmed.starts_with("sqlite://") {
        return Err(EtlError::Config(format!(
            "unsupported database scheme in '{trimmed}', expected sqlite://<path>"
        )));
    }
    Ok(PathBuf::from(path))
}

#[async_trait]
impl Sink for SqliteSink {
    fn name(&self) -> &'static str {
        SQLITE_SINK
    }

    async fn load(&self, dataset: &Dataset) -> Result<()> {
        let sink = self.clone();
        let dataset = dataset.clone();
        tokio::task::spawn_blocking(move || sink.write(&dataset)).await?
    }
}
