use crate::types::date_window::{InvalidRangeError, MAX_WINDOW_DAYS};
use crate::types::endpoint::{EndpointUrls, DEFAULT_ARCHIVE_URL, DEFAULT_FORECAST_URL};
use crate::types::location::Location;
use crate::warehouse::bigquery::{LoadOptions, DEFAULT_API_BASE};
use crate::warehouse::error::LoadError;
use crate::warehouse::table::TableRef;
use crate::weather_data::fetcher::{HttpSettings, RetryPolicy};
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};
use thiserror::Error;

/// Env file read at startup when none is given explicitly.
pub const DEFAULT_ENV_FILE: &str = "credentials.env";

/// Variable triples naming the destination table, checked in order.
const TABLE_ENV_VARS: [[&str; 3]; 2] = [
    ["PROJECT_ID", "DATASET_ID", "TABLE_ID"],
    ["GCP_PROJECT_ID", "BQ_DATASET_ID", "BQ_TABLE_ID"],
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Failed to load env file '{0}'")]
    EnvFile(PathBuf, #[source] dotenvy::Error),

    #[error(
        "No destination table configured.\n\
         Hint: set `warehouse.table` or PROJECT_ID, DATASET_ID and TABLE_ID."
    )]
    MissingTable,

    #[error(transparent)]
    Table(#[from] LoadError),

    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub window_days: u32,
    pub delay_secs: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(1991, 6, 7).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(1999, 12, 31).unwrap_or_default(),
            window_days: MAX_WINDOW_DAYS,
            delay_secs: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub archive_url: String,
    pub forecast_url: String,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            read_timeout_secs: 120,
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            max_retries: 0,
            retry_backoff_ms: 1000,
        }
    }
}

impl HttpConfig {
    pub fn settings(&self) -> HttpSettings {
        HttpSettings::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .read_timeout(Duration::from_secs(self.read_timeout_secs))
            .urls(EndpointUrls {
                archive: self.archive_url.clone(),
                forecast: self.forecast_url.clone(),
            })
            .retry(RetryPolicy {
                max_retries: self.max_retries,
                initial_backoff: Duration::from_millis(self.retry_backoff_ms),
            })
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// `project.dataset.table`; falls back to the environment when absent.
    pub table: Option<String>,
    pub skip_leading_rows: u32,
    pub poll_interval_ms: u64,
    pub access_token: Option<String>,
    pub api_base: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            table: None,
            skip_leading_rows: 0,
            poll_interval_ms: 1000,
            access_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl WarehouseConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::builder()
            .skip_leading_rows(self.skip_leading_rows)
            .build()
    }

    /// Resolves the destination from `table`, else from the environment.
    pub fn destination(&self) -> Result<TableRef, ConfigError> {
        if let Some(table) = &self.table {
            return Ok(table.parse()?);
        }
        for [project, dataset, table] in TABLE_ENV_VARS {
            if let (Ok(p), Ok(d), Ok(t)) = (env::var(project), env::var(dataset), env::var(table)) {
                debug!("Destination table taken from {project}, {dataset}, {table}");
                return Ok(TableRef::new(&p, &d, &t)?);
            }
        }
        Err(ConfigError::MissingTable)
    }
}

/// Everything a pipeline run needs, with defaults for the Cleveland, TN job.
///
/// Example TOML:
/// ```toml
/// staging_dir = "/var/tmp/weather_etl"
///
/// [location]
/// city = "Cleveland"
/// latitude = 35.1595
/// longitude = -84.8766
///
/// [backfill]
/// start_date = "1991-06-07"
/// end_date = "1999-12-31"
///
/// [warehouse]
/// table = "my-project.weather.daily"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub location: Location,
    pub backfill: BackfillConfig,
    pub http: HttpConfig,
    pub warehouse: WarehouseConfig,
    pub staging_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))
    }

    /// Reads `path` if given, otherwise starts from the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given, using built-in defaults");
            return Ok(Self::default());
        };
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config = Self::from_toml_str(&contents, path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads an env file into the process environment. A missing default file is not an error.
    pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_ENV_FILE), false),
        };
        if !required && !path.exists() {
            return Ok(());
        }
        dotenvy::from_path(&path).map_err(|e| ConfigError::EnvFile(path.clone(), e))?;
        debug!("Loaded environment from {}", path.display());
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.backfill.delay_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.location.validate().map_err(ConfigError::Invalid)?;
        if self.backfill.start_date > self.backfill.end_date {
            return Err(InvalidRangeError {
                start: self.backfill.start_date,
                end: self.backfill.end_date,
            }
            .into());
        }
        if self.http.connect_timeout_secs == 0 || self.http.read_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "HTTP timeouts must be greater than zero".to_string(),
            ));
        }
        if self.http.archive_url.is_empty() || self.http.forecast_url.is_empty() {
            return Err(ConfigError::Invalid("endpoint URLs must not be empty".to_string()));
        }
        if let Some(table) = &self.warehouse.table {
            table.parse::<TableRef>()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cleveland_job() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.location.city, "Cleveland");
        assert_eq!(cfg.backfill.start_date, NaiveDate::from_ymd_opt(1991, 6, 7).unwrap());
        assert_eq!(cfg.backfill.end_date, NaiveDate::from_ymd_opt(1999, 12, 31).unwrap());
        assert_eq!(cfg.backfill.window_days, 28);
        assert_eq!(cfg.request_delay(), Duration::from_secs(3));
        assert_eq!(cfg.http.settings().read_timeout, Duration::from_secs(120));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
            staging_dir = "/tmp/staging"

            [location]
            city = "Chattanooga"
            zip = "37402"
            latitude = 35.0456
            longitude = -85.3097

            [backfill]
            start_date = "2020-01-01"
            end_date = "2020-12-31"
            delay_secs = 0

            [warehouse]
            table = "proj.weather.daily"
            "#,
            Path::new("test.toml"),
        )
        .unwrap();

        assert_eq!(cfg.location.city, "Chattanooga");
        assert_eq!(cfg.location.state, "TN");
        assert_eq!(cfg.location.timezone, "America/New_York");
        assert_eq!(cfg.backfill.window_days, 28);
        assert_eq!(cfg.request_delay(), Duration::ZERO);
        assert_eq!(cfg.staging_dir, Some(PathBuf::from("/tmp/staging")));
        assert_eq!(
            cfg.warehouse.destination().unwrap(),
            "proj.weather.daily".parse().unwrap()
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let cfg = PipelineConfig::from_toml_str(
            include_str!("../config/weather_etl.example.toml"),
            Path::new("weather_etl.example.toml"),
        )
        .unwrap();
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = PipelineConfig::from_toml_str("[backfill]\nstart_date = 5", Path::new("bad.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut cfg = PipelineConfig::default();
        cfg.backfill.start_date = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        cfg.backfill.end_date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidRange(_))));
    }

    #[test]
    fn test_validate_rejects_bad_location_and_table() {
        let mut cfg = PipelineConfig::default();
        cfg.location.latitude = -100.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = PipelineConfig::default();
        cfg.warehouse.table = Some("only.two".to_string());
        assert!(matches!(cfg.validate(), Err(ConfigError::Table(_))));
    }

    #[test]
    fn test_missing_explicit_env_file_is_an_error() {
        let err = PipelineConfig::load_env_file(Some(Path::new("/nonexistent/creds.env")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile(..)));
    }

    #[test]
    fn test_load_options_follow_config() {
        let mut cfg = WarehouseConfig::default();
        assert_eq!(cfg.load_options().skip_leading_rows, 0);
        cfg.skip_leading_rows = 1;
        assert_eq!(cfg.load_options().skip_leading_rows, 1);
        assert!(cfg.load_options().autodetect);
    }
}
