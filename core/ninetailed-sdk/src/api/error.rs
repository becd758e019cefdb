//! API error types.

use thiserror::Error;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur talking to the Ninetailed APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The per-request timeout elapsed. Never retried.
    #[error("request timed out")]
    Timeout,

    /// The service kept answering 503 until the retry budget ran out.
    #[error("service unavailable after {attempts} attempts")]
    ServiceUnavailable { attempts: u32 },

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    /// The response envelope reported an error.
    #[error("API error: {0}")]
    Response(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns true for errors the client retries (503 responses).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
            || matches!(self, Self::Status { status, .. } if *status == 503)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// The HTTP status behind the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServiceUnavailable { .. } => Some(503),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}
