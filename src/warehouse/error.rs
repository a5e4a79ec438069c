use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid destination table '{0}', expected 'project.dataset.table'")]
    InvalidTableId(String),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Failed to obtain an access token: {0}")]
    AccessToken(String),

    #[error("Failed to read staging file '{0}'")]
    StagingRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode load job configuration")]
    Encode(#[from] serde_json::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}: {body}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode job response from {0}")]
    Decode(String, #[source] reqwest::Error),

    #[error("Load job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },
}
