//! Published-spreadsheet integration.
//!
//! The billing sheet is published as a CSV export; we fetch it with a plain
//! HTTP GET (no auth header, no pagination) and hand the text to the ingest
//! module.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::data::RecordSource;
use crate::domain::Record;
use crate::error::{AppError, FetchError};
use crate::io::ingest::parse_records;

/// CSV export of the billing sheet.
pub const DEFAULT_SHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1701Z2SGGkWaFwxTZBOnaZBbeZqzo9mQ6Ubc1XhqYfsQ/export?format=csv";

/// Environment variable (or `.env` key) overriding [`DEFAULT_SHEET_URL`].
pub const SHEET_URL_ENV: &str = "DAIRY_SHEET_URL";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct SheetClient {
    client: Client,
    url: String,
}

impl SheetClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Resolve the sheet URL from `.env`/environment, falling back to the default.
    pub fn from_env(timeout: Duration) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let url = std::env::var(SHEET_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SHEET_URL.to_string());
        Self::new(url, timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the raw CSV text.
    pub fn fetch_csv(&self) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| FetchError::new(format!("Request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(FetchError::new(format!(
                "Failed to fetch data (status {}).",
                resp.status()
            )));
        }

        resp.text()
            .map_err(|e| FetchError::new(format!("Failed to read response body: {e}")))
    }
}

impl RecordSource for SheetClient {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch_records(&self) -> Result<Vec<Record>, FetchError> {
        tracing::info!(url = %self.url, "fetching billing sheet");
        let text = self.fetch_csv()?;
        let ingested = parse_records(&text);
        tracing::info!(
            rows_read = ingested.rows_read,
            records = ingested.records.len(),
            "fetched billing sheet"
        );
        Ok(ingested.records)
    }
}

/// A local CSV export with the same layout as the published sheet.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch_records(&self) -> Result<Vec<Record>, FetchError> {
        tracing::info!(path = %self.path.display(), "reading billing CSV");
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            FetchError::new(format!("Failed to read '{}': {e}", self.path.display()))
        })?;
        Ok(parse_records(&text).records)
    }
}
