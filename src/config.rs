//! Runtime configuration.
//!
//! Values come from the environment (optionally via a `.env` file) and can be
//! overridden per-invocation by CLI flags (see `cli::SourceArgs`).
//!
//! | variable                  | default                                         |
//! |---------------------------|-------------------------------------------------|
//! | `COVID_API_URL`           | `https://api.coronavirus.data.gov.uk/v1/data`   |
//! | `COVID_AREA_TYPE`         | `overview`                                      |
//! | `COVID_AREA_NAME`         | unset                                           |
//! | `COVID_SNAPSHOT`          | `data/uk_covid.json`                            |
//! | `COVID_HTTP_TIMEOUT_SECS` | `30`                                            |
//! | `COVID_LOG_FILE`          | `covid.log` (TUI only)                          |

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::SourceArgs;
use crate::domain::{AreaFilter, FieldMapping};
use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "https://api.coronavirus.data.gov.uk/v1/data";
pub const DEFAULT_SNAPSHOT: &str = "data/uk_covid.json";
pub const DEFAULT_LOG_FILE: &str = "covid.log";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub filter: AreaFilter,
    pub mapping: FieldMapping,
    pub snapshot_path: PathBuf,
    pub http_timeout: Duration,
    pub log_file: PathBuf,
    /// Skip the snapshot at startup and go straight to the API.
    pub live: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            filter: AreaFilter::default(),
            mapping: FieldMapping::default(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            live: false,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the `COVID_*` variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(url) = non_empty(lookup("COVID_API_URL")) {
            config.api_url = url;
        }
        if let Some(area_type) = non_empty(lookup("COVID_AREA_TYPE")) {
            config.filter.area_type = area_type;
        }
        config.filter.area_name = non_empty(lookup("COVID_AREA_NAME"));
        if let Some(path) = non_empty(lookup("COVID_SNAPSHOT")) {
            config.snapshot_path = PathBuf::from(path);
        }
        if let Some(raw) = non_empty(lookup("COVID_HTTP_TIMEOUT_SECS")) {
            let secs = raw.parse::<u64>().map_err(|e| {
                AppError::usage(format!("Invalid COVID_HTTP_TIMEOUT_SECS '{raw}': {e}"))
            })?;
            config.http_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(path) = non_empty(lookup("COVID_LOG_FILE")) {
            config.log_file = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Apply CLI overrides on top of the environment.
    pub fn apply_source_args(mut self, args: &SourceArgs) -> Self {
        if let Some(path) = &args.snapshot {
            self.snapshot_path = path.clone();
        }
        if let Some(area_type) = &args.area_type {
            self.filter.area_type = area_type.clone();
        }
        if let Some(area_name) = &args.area_name {
            self.filter.area_name = Some(area_name.clone());
        }
        self.live = args.live;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_values_override_defaults() {
        let vars: HashMap<&str, &str> = [
            ("COVID_AREA_TYPE", "nation"),
            ("COVID_AREA_NAME", "scotland"),
            ("COVID_HTTP_TIMEOUT_SECS", "5"),
            ("COVID_API_URL", "  "),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.filter.to_query(), "areaType=nation;areaName=scotland");
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.snapshot_path, PathBuf::from(DEFAULT_SNAPSHOT));
    }

    #[test]
    fn bad_timeout_is_a_usage_error() {
        let err = AppConfig::from_lookup(|k| (k == "COVID_HTTP_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn cli_overrides_apply_last() {
        let args = SourceArgs {
            snapshot: Some(PathBuf::from("snap.json")),
            live: true,
            area_type: Some("nation".to_string()),
            area_name: Some("wales".to_string()),
        };
        let config = AppConfig::default().apply_source_args(&args);
        assert!(config.live);
        assert_eq!(config.snapshot_path, PathBuf::from("snap.json"));
        assert_eq!(config.filter.area_name.as_deref(), Some("wales"));
    }
}
