use crate::config::ConfigError;
use crate::staging::error::WriteError;
use crate::types::date_window::InvalidRangeError;
use crate::warehouse::error::LoadError;
use crate::weather_data::error::{FetchError, MalformedResponseError};
use thiserror::Error;

/// Any failure that aborts a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    MalformedResponse(#[from] MalformedResponseError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
