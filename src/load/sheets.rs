use crate::constants::SHEETS_SINK;
use crate::error::{EtlError, Result};
use crate::load::Sink;
use crate::types::Dataset;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

static SPREADSHEET_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("spreadsheet id pattern is valid")
});

/// The handful of Sheets operations the sink needs.
#[async_trait]
pub trait SheetsApi: Send + Sync {
    async fn worksheet_titles(&self) -> Result<Vec<String>>;

    async fn add_worksheet(&self, title: &str) -> Result<()>;

    /// Remove every value from the worksheet.
    async fn clear(&self, worksheet: &str) -> Result<()>;

    /// Write `values` row by row starting at A1.
    async fn update(&self, worksheet: &str, values: Vec<Vec<Value>>) -> Result<()>;
}

/// Google Sheets REST v4 client authenticated with a bearer token.
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    access_token: String,
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(rename = "type")]
    kind: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

impl GoogleSheetsClient {
    pub fn new(access_token: String, spreadsheet_id: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            access_token,
            spreadsheet_id,
        })
    }

    pub fn from_credentials(credentials_path: &Path, sheet_url: &str, timeout: Duration) -> Result<Self> {
        let token = read_access_token(credentials_path)?;
        Self::new(token, spreadsheet_id(sheet_url)?, timeout)
    }

    fn url(&self, suffix_segments: &[&str], query: Option<(&str, &str)>) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API_BASE)
            .map_err(|e| EtlError::Config(format!("invalid Sheets API base URL: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| EtlError::Config("Sheets API base URL cannot take a path".to_string()))?;
            segments.pop_if_empty();
            for segment in suffix_segments {
                segments.push(segment);
            }
        }
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, action: &str) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        if status.is_success() {
            debug!("Sheets {} succeeded", action);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(EtlError::Auth(format!(
                "Sheets {action} rejected with {status}: {body}"
            ))),
            _ => Err(EtlError::Api {
                message: format!("Sheets {action} failed with {status}: {body}"),
            }),
        }
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn worksheet_titles(&self) -> Result<Vec<String>> {
        let url = self.url(&[&self.spreadsheet_id], Some(("fields", "sheets.properties.title")))?;
        let response = self.send(self.client.get(url), "metadata").await?;
        let meta: SpreadsheetMeta = response.json().await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn add_worksheet(&self, title: &str) -> Result<()> {
        let url = self.url(&[&format!("{}:batchUpdate", self.spreadsheet_id)], None)?;
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        self.send(self.client.post(url).json(&body), "addSheet").await?;
        Ok(())
    }

    async fn clear(&self, worksheet: &str) -> Result<()> {
        let range = worksheet_range(worksheet);
        let url = self.url(&[&self.spreadsheet_id, "values", &format!("{range}:clear")], None)?;
        self.send(self.client.post(url).json(&json!({})), "clear").await?;
        Ok(())
    }

    async fn update(&self, worksheet: &str, values: Vec<Vec<Value>>) -> Result<()> {
        let range = format!("{}!A1", worksheet_range(worksheet));
        let url = self.url(
            &[&self.spreadsheet_id, "values", &range],
            Some(("valueInputOption", "RAW")),
        )?;
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        self.send(self.client.put(url).json(&body), "update").await?;
        Ok(())
    }
}

/// Read an OAuth access token from a credentials JSON file.
///
/// Service-account key files are rejected: they have to be exchanged for a
/// token first (e.g. `gcloud auth print-access-token`).
pub fn read_access_token(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| {
        EtlError::Auth(format!("cannot read credentials file '{}': {}", path.display(), e))
    })?;
    let credentials: CredentialsFile = serde_json::from_str(&content)?;

    match credentials.access_token {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ if credentials.kind.as_deref() == Some("service_account") => Err(EtlError::Auth(
            "service account key files are not supported, provide a file with an access_token".to_string(),
        )),
        _ => Err(EtlError::Auth(format!(
            "credentials file '{}' has no access_token",
            path.display()
        ))),
    }
}

/// Spreadsheet id from a full sheet URL, or the value itself if it already is an id.
pub fn spreadsheet_id(sheet_url: &str) -> Result<String> {
    let trimmed = sheet_url.trim();
    if let Some(captures) = SPREADSHEET_ID_RE.captures(trimmed) {
        return Ok(captures[1].to_string());
    }
    if !trimmed.is_empty() && !trimmed.contains('/') {
        return Ok(trimmed.to_string());
    }
    Err(EtlError::Config(format!("cannot find a spreadsheet id in '{trimmed}'")))
}

/// A1-notation sheet reference; names are quoted so spaces and punctuation survive.
fn worksheet_range(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

/// Header row followed by one row per record. Timestamps are sent as text.
pub fn sheet_values(dataset: &Dataset) -> Vec<Vec<Value>> {
    let mut values = Vec::with_capacity(dataset.len() + 1);
    values.push(dataset.columns().iter().map(|c| json!(c)).collect());
    for record in dataset {
        values.push(vec![
            json!(record.title),
            json!(record.price),
            json!(record.rating),
            json!(record.colors),
            json!(record.size),
            json!(record.gender),
            json!(record.collected_at_text()),
        ]);
    }
    values
}

/// Replaces a worksheet's contents with the dataset.
pub struct SheetsSink<C: SheetsApi> {
    client: C,
    worksheet: String,
}

impl<C: SheetsApi> SheetsSink<C> {
    pub fn new(client: C, worksheet: &str) -> Self {
        Self {
            client,
            worksheet: worksheet.to_string(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: SheetsApi> Sink for SheetsSink<C> {
    fn name(&self) -> &'static str {
        SHEETS_SINK
    }

    #[instrument(skip(self, dataset), fields(worksheet = %self.worksheet, rows = dataset.len()))]
    async fn load(&self, dataset: &Dataset) -> Result<()> {
        let titles = self.client.worksheet_titles().await?;
        if !titles.iter().any(|t| t == &self.worksheet) {
            info!("Worksheet '{}' not found, creating it", self.worksheet);
            self.client.add_worksheet(&self.worksheet).await?;
        }

        self.client.clear(&self.worksheet).await?;
        self.client.update(&self.worksheet, sheet_values(dataset)).await?;

        info!("Uploaded {} rows to worksheet '{}'", dataset.len(), self.worksheet);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypedRecord;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingSheets {
        titles: Vec<String>,
        calls: Mutex<Vec<String>>,
        written: Mutex<Vec<Vec<Value>>>,
    }

    #[async_trait]
    impl SheetsApi for RecordingSheets {
        async fn worksheet_titles(&self) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push("titles".into());
            Ok(self.titles.clone())
        }

        async fn add_worksheet(&self, title: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("add:{title}"));
            Ok(())
        }

        async fn clear(&self, worksheet: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("clear:{worksheet}"));
            Ok(())
        }

        async fn update(&self, worksheet: &str, values: Vec<Vec<Value>>) -> Result<()> {
            self.calls.lock().unwrap().push(format!("update:{worksheet}"));
            *self.written.lock().unwrap() = values;
            Ok(())
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![TypedRecord {
            title: "T-shirt 2".into(),
            price: 1_634_400.0,
            rating: 3.9,
            colors: 3,
            size: "M".into(),
            gender: "Women".into(),
            collected_at: Utc.with_ymd_and_hms(2025, 2, 10, 7, 30, 0).unwrap(),
        }])
    }

    #[tokio::test]
    async fn test_clears_before_writing() {
        let client = RecordingSheets {
            titles: vec!["products".into()],
            ..Default::default()
        };
        let sink = SheetsSink::new(client, "products");
        sink.load(&dataset()).await.unwrap();

        let calls = sink.client().calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["titles", "clear:products", "update:products"]);

        let written = sink.client().written.lock().unwrap().clone();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0][0], json!("title"));
        assert_eq!(written[0][6], json!("collected_at"));
        assert_eq!(written[1][1], json!(1_634_400.0));
        assert_eq!(written[1][3], json!(3));
        assert_eq!(written[1][6], json!("2025-02-10 07:30:00.000000"));
    }

    #[tokio::test]
    async fn test_creates_missing_worksheet() {
        let client = RecordingSheets {
            titles: vec!["Sheet1".into()],
            ..Default::default()
        };
        let sink = SheetsSink::new(client, "products");
        sink.load(&dataset()).await.unwrap();

        let calls = sink.client().calls.lock().unwrap().clone();
        assert_eq!(calls[1], "add:products");
        assert_eq!(calls[2], "clear:products");
    }

    #[test]
    fn test_spreadsheet_id() {
        assert_eq!(
            spreadsheet_id("https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=0").unwrap(),
            "1AbC-d_9"
        );
        assert_eq!(spreadsheet_id("1AbC-d_9").unwrap(), "1AbC-d_9");
        assert!(spreadsheet_id("https://example.com/nothing").is_err());
    }

    #[test]
    fn test_worksheet_range_quotes_name() {
        assert_eq!(worksheet_range("products"), "'products'");
        assert_eq!(worksheet_range("Bob's sheet"), "'Bob''s sheet'");
    }

    #[test]
    fn test_read_access_token() {
        let dir = tempdir().unwrap();

        let token_file = dir.path().join("token.json");
        fs::write(&token_file, r#"{"access_token": " ya29.token "}"#).unwrap();
        assert_eq!(read_access_token(&token_file).unwrap(), "ya29.token");

        let sa_file = dir.path().join("sa.json");
        fs::write(&sa_file, r#"{"type": "service_account", "private_key": "..."}"#).unwrap();
        assert!(matches!(read_access_token(&sa_file), Err(EtlError::Auth(_))));

        assert!(matches!(
            read_access_token(&dir.path().join("missing.json")),
            Err(EtlError::Auth(_))
        ));
    }

    #[test]
    fn test_url_building() {
        let client =
            GoogleSheetsClient::new("t".into(), "abc".into(), Duration::from_secs(5)).unwrap();
        let url = client
            .url(&["abc", "values", "'products':clear"], None)
            .unwrap();
        assert!(url.as_str().starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc/values/"));
        assert!(url.as_str().ends_with(":clear"));
    }
}
