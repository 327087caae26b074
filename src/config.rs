use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_OUTPUT_PATH, DEFAULT_PAGE_COUNT, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TABLE_NAME, DEFAULT_WORKSHEET_NAME,
};
use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Settings for one ETL run.
///
/// Only `exchange_rate` is required. The spreadsheet sink runs only when
/// both `credentials_path` and `sheet_url` are set, the relational sink only
/// when `database_uri` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Source currency (USD) to destination currency (IDR).
    pub exchange_rate: f64,

    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_count")]
    pub page_count: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    #[serde(default)]
    pub sheet_url: Option<String>,
    #[serde(default = "default_worksheet_name")]
    pub worksheet_name: String,

    #[serde(default)]
    pub database_uri: Option<String>,
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_count() -> u32 {
    DEFAULT_PAGE_COUNT
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_worksheet_name() -> String {
    DEFAULT_WORKSHEET_NAME.to_string()
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

impl Config {
    /// Defaults everywhere except the exchange rate.
    pub fn new(exchange_rate: f64) -> Self {
        Self {
            exchange_rate,
            base_url: default_base_url(),
            page_count: default_page_count(),
            request_timeout_secs: default_request_timeout_secs(),
            output_path: default_output_path(),
            credentials_path: None,
            sheet_url: None,
            worksheet_name: default_worksheet_name(),
            database_uri: None,
            table_name: default_table_name(),
        }
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup using the environment variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let exchange_rate = get("EXCHANGE_RATE_USD_TO_IDR").ok_or_else(|| {
            EtlError::Config("EXCHANGE_RATE_USD_TO_IDR must be set".to_string())
        })?;
        let mut config = Config::new(parse_number("EXCHANGE_RATE_USD_TO_IDR", &exchange_rate)?);

        if let Some(v) = get("BASE_URL") {
            config.base_url = v;
        }
        if let Some(v) = get("PAGE_COUNT") {
            config.page_count = parse_number("PAGE_COUNT", &v)?;
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("CSV_OUTPUT_PATH") {
            config.output_path = PathBuf::from(v);
        }
        config.credentials_path = get("GSHEET_CREDENTIALS_PATH").map(PathBuf::from);
        config.sheet_url = get("GSHEET_URL");
        if let Some(v) = get("GSHEET_WORKSHEET") {
            config.worksheet_name = v;
        }
        config.database_uri = get("DATABASE_URI");
        if let Some(v) = get("DB_TABLE_NAME") {
            config.table_name = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.exchange_rate.is_finite() || self.exchange_rate <= 0.0 {
            return Err(EtlError::Config(format!(
                "exchange_rate must be a positive number, got {}",
                self.exchange_rate
            )));
        }
        if self.page_count == 0 {
            return Err(EtlError::Config("page_count must be at least 1".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(EtlError::Config("base_url must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| EtlError::Config(format!("{key} must be numeric, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_toml_defaults() {
        let config = Config::from_toml_str("exchange_rate = 16000.0").unwrap();
        assert_eq!(config.exchange_rate, 16000.0);
        assert_eq!(config.output_path, PathBuf::from("products.csv"));
        assert_eq!(config.table_name, "products");
        assert_eq!(config.worksheet_name, "products");
        assert_eq!(config.page_count, 50);
        assert!(config.database_uri.is_none());
        assert!(config.credentials_path.is_none());
        assert!(config.sheet_url.is_none());
    }

    #[test]
    fn test_toml_requires_exchange_rate() {
        assert!(matches!(
            Config::from_toml_str("output_path = \"out.csv\""),
            Err(EtlError::Toml(_))
        ));
    }

    #[test]
    fn test_env_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("EXCHANGE_RATE_USD_TO_IDR", "16000"),
            ("PAGE_COUNT", "3"),
            ("CSV_OUTPUT_PATH", "out/products.csv"),
            ("GSHEET_CREDENTIALS_PATH", "token.json"),
            ("GSHEET_URL", "https://docs.google.com/spreadsheets/d/abc123/edit"),
            ("DATABASE_URI", "sqlite://products.db"),
            ("DB_TABLE_NAME", "fashion"),
        ]))
        .unwrap();

        assert_eq!(config.exchange_rate, 16000.0);
        assert_eq!(config.page_count, 3);
        assert_eq!(config.output_path, PathBuf::from("out/products.csv"));
        assert_eq!(config.credentials_path, Some(PathBuf::from("token.json")));
        assert_eq!(
            config.sheet_url.as_deref(),
            Some("https://docs.google.com/spreadsheets/d/abc123/edit")
        );
        assert_eq!(config.database_uri.as_deref(), Some("sqlite://products.db"));
        assert_eq!(config.table_name, "fashion");
    }

    #[test]
    fn test_env_missing_exchange_rate() {
        let err = Config::from_lookup(lookup(&[("PAGE_COUNT", "3")])).unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }

    #[test]
    fn test_env_rejects_bad_numbers() {
        assert!(Config::from_lookup(lookup(&[("EXCHANGE_RATE_USD_TO_IDR", "lots")])).is_err());
        assert!(Config::from_lookup(lookup(&[("EXCHANGE_RATE_USD_TO_IDR", "-1")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("EXCHANGE_RATE_USD_TO_IDR", "16000"),
            ("PAGE_COUNT", "0"),
        ]))
        .is_err());
    }
}
