use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to resolve staging directory")]
    StagingDirResolution,

    #[error("Failed to create staging directory '{0}'")]
    StagingDirCreation(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing staging file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to build table from observations")]
    DataFrame(#[source] PolarsError),

    #[error("Encoding error writing CSV staging file '{0}'")]
    Csv(PathBuf, #[source] PolarsError),

    #[error("Failed to serialize raw response to '{0}'")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
