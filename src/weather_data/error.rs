use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}: {body}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode JSON response from {0}")]
    Decode(String, #[source] reqwest::Error),
}

impl FetchError {
    /// Whether a retry could plausibly succeed.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            FetchError::NetworkRequest(..) => true,
            FetchError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::ClientBuild(_) | FetchError::Decode(..) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedResponseError {
    #[error("Required field '{0}' not found in weather response")]
    MissingField(String),

    #[error("Field '{field}' has an unexpected type, expected {expected}")]
    UnexpectedType {
        field: String,
        expected: &'static str,
    },

    #[error("Field '{field}' has {found} values but 'daily.time' has {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("Field '{field}' holds '{value}', expected a YYYY-MM-DDTHH:MM timestamp")]
    InvalidTimestamp { field: String, value: String },
}
