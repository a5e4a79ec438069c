//! The local directory holding the files handed to the warehouse.
//!
//! Both files have fixed names and are overwritten on every window, so only
//! one pipeline may use a staging directory at a time.

use crate::staging::error::WriteError;
use crate::staging::writer::write_observations;
use crate::types::observation::DailyObservation;
use crate::utils::{default_staging_dir, ensure_dir_exists};
use crate::weather_data::fetcher::RawWeatherResponse;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::task;

pub const CSV_FILE_NAME: &str = "weather_data.csv";
pub const RAW_FILE_NAME: &str = "current_weather.json";

#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Uses `dir`, creating it if needed.
    pub async fn new(dir: PathBuf) -> Result<Self, WriteError> {
        ensure_dir_exists(&dir)
            .await
            .map_err(|e| WriteError::StagingDirCreation(dir.clone(), e))?;
        Ok(Self { dir })
    }

    /// Uses the platform cache directory.
    pub async fn in_cache_dir() -> Result<Self, WriteError> {
        let dir = default_staging_dir().ok_or(WriteError::StagingDirResolution)?;
        Self::new(dir).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn csv_path(&self) -> PathBuf {
        self.dir.join(CSV_FILE_NAME)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.dir.join(RAW_FILE_NAME)
    }

    /// Dumps the API body as pretty-printed JSON.
    pub async fn write_raw_response(
        &self,
        response: &RawWeatherResponse,
    ) -> Result<PathBuf, WriteError> {
        let path = self.raw_path();
        let bytes = serde_json::to_vec_pretty(response.json())
            .map_err(|e| WriteError::Json(path.clone(), e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| WriteError::Io(path.clone(), e))?;
        debug!("Raw response written to {}", path.display());
        Ok(path)
    }

    /// Writes the observations to the CSV staging file on a blocking thread.
    /// Returns the file path and the number of rows written.
    pub async fn stage(
        &self,
        observations: Vec<DailyObservation>,
    ) -> Result<(PathBuf, usize), WriteError> {
        let path = self.csv_path();
        let target = path.clone();
        let rows = task::spawn_blocking(move || write_observations(&observations, &target)).await??;
        Ok((path, rows))
    }
}
