//! UK coronavirus dashboard API client.
//!
//! The endpoint takes three parameters that matter here:
//!
//! - `filters`: `areaType=...;areaName=...`
//! - `structure`: a JSON object mapping output field names to API metrics
//! - `page`: 1-based page number
//!
//! Pages are fetched until `pagination.next` is null (or the API answers
//! `204 No Content`, which it does for filters with no data).

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::data::RecordSource;
use crate::data::snapshot::write_snapshot;
use crate::domain::{AreaFilter, FieldMapping, RawRecord};
use crate::error::AppError;

/// Hard stop in case the API keeps advertising a next page.
const MAX_PAGES: usize = 100;

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::external(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    /// Fetch every page for `filter`, renaming metrics per `mapping`.
    pub fn fetch_records(
        &self,
        filter: &AreaFilter,
        mapping: &FieldMapping,
    ) -> Result<Vec<RawRecord>, AppError> {
        let filters = filter.to_query();
        let structure = mapping.to_structure_json();
        let mut records = Vec::new();

        for page in 1..=MAX_PAGES {
            let resp = self
                .client
                .get(&self.base_url)
                .query(&[
                    ("filters", filters.as_str()),
                    ("structure", structure.as_str()),
                    ("format", "json"),
                    ("page", &page.to_string()),
                ])
                .send()
                .map_err(|e| AppError::external(format!("API request failed: {e}")))?;

            if resp.status() == StatusCode::NO_CONTENT {
                debug!(page, "API returned no content");
                return Ok(records);
            }
            if !resp.status().is_success() {
                return Err(AppError::external(format!("API request failed with status {}.", resp.status())));
            }

            let body = resp
                .text()
                .map_err(|e| AppError::external(format!("Failed to read API response: {e}")))?;
            let parsed = parse_page(&body)?;
            debug!(page, records = parsed.records.len(), "fetched API page");
            records.extend(parsed.records);

            if !parsed.has_next {
                info!(pages = page, records = records.len(), filters = %filters, "API fetch complete");
                return Ok(records);
            }
        }

        warn!(max = MAX_PAGES, "API pagination did not terminate");
        Err(AppError::external(format!("API returned more than {MAX_PAGES} pages.")))
    }
}

/// One decoded API page.
#[derive(Debug)]
pub struct Page {
    pub records: Vec<RawRecord>,
    pub has_next: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    data: Vec<RawRecord>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    next: Option<String>,
}

/// Decode a page body. Schema mismatches are API errors (exit code 4).
pub fn parse_page(body: &str) -> Result<Page, AppError> {
    let resp: ApiResponse = serde_json::from_str(body)
        .map_err(|e| AppError::external(format!("Failed to parse API response: {e}")))?;
    let has_next = resp
        .pagination
        .and_then(|p| p.next)
        .is_some_and(|next| !next.trim().is_empty());
    Ok(Page {
        records: resp.data,
        has_next,
    })
}

/// Live API as a record source.
///
/// When `snapshot` is set, records that wrangled cleanly also replace the
/// cached snapshot file. Failing to write it is logged, not fatal.
pub struct ApiSource {
    pub client: ApiClient,
    pub filter: AreaFilter,
    pub mapping: FieldMapping,
    pub snapshot: Option<std::path::PathBuf>,
}

impl ApiSource {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: ApiClient::from_config(config)?,
            filter: config.filter.clone(),
            mapping: config.mapping.clone(),
            snapshot: Some(config.snapshot_path.clone()),
        })
    }
}

impl RecordSource for ApiSource {
    fn fetch(&self) -> Result<Vec<RawRecord>, AppError> {
        self.client.fetch_records(&self.filter, &self.mapping)
    }

    fn describe(&self) -> String {
        format!("API ({})", self.filter.to_query())
    }

    fn commit(&self, records: &[RawRecord]) {
        let Some(path) = &self.snapshot else {
            return;
        };
        if records.is_empty() {
            return;
        }
        if let Err(err) = write_snapshot(path, records) {
            warn!(path = %path.display(), error = %err, "could not update snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_with_nulls_and_next_link() {
        let body = r#"{
            "length": 2,
            "maxPageLimit": 2500,
            "data": [
                {"Date": "2021-01-02", "cases": 120, "hospital": null},
                {"Date": "2021-01-01", "cases": 100, "hospital": 30}
            ],
            "pagination": {
                "current": "/v1/data?page=1",
                "next": "/v1/data?page=2",
                "previous": null,
                "first": "/v1/data?page=1",
                "last": "/v1/data?page=2"
            }
        }"#;
        let page = parse_page(body).unwrap();
        assert!(page.has_next);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].get("hospital"), Some(&serde_json::Value::Null));
        assert_eq!(page.records[1].get("cases").and_then(|v| v.as_f64()), Some(100.0));
    }

    #[test]
    fn last_page_has_no_next() {
        let body = r#"{"data": [], "pagination": {"next": null}}"#;
        let page = parse_page(body).unwrap();
        assert!(!page.has_next);
        assert!(page.records.is_empty());

        let body = r#"{"data": []}"#;
        assert!(!parse_page(body).unwrap().has_next);
    }

    #[test]
    fn schema_mismatch_is_an_api_error() {
        let err = parse_page(r#"{"response": "maintenance"}"#).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn commit_writes_the_snapshot() {
        let dir = std::env::temp_dir().join(format!("covid-api-commit-{}", std::process::id()));
        let config = AppConfig {
            snapshot_path: dir.join("snap.json"),
            ..AppConfig::default()
        };
        let source = ApiSource::from_config(&config).unwrap();

        source.commit(&[]);
        assert!(!config.snapshot_path.exists());

        let records = vec![RawRecord::new("2021-01-01").with("cases", 4)];
        source.commit(&records);
        let back = crate::data::read_snapshot(&config.snapshot_path).unwrap();
        assert_eq!(back, records);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
