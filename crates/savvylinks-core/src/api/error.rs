//! Remote fetch errors

use thiserror::Error;

/// Errors that can occur talking to the SavvyCal API
#[derive(Error, Debug)]
pub enum FetchError {
    /// No token configured; the request was never sent
    #[error("No API token configured")]
    Unauthenticated,

    /// Network-level failure (DNS, connect, TLS, timeout, body read)
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API returned HTTP {0}")]
    HttpStatus(u16),

    /// Body did not match the expected schema
    #[error("Failed to decode API response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FetchError {
    /// Short machine-friendly label, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Unauthenticated => "unauthenticated",
            FetchError::Transport(_) => "transport",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Decode(_) => "decode",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e)
    }
}

/// Result type for API operations
pub type FetchResult<T> = Result<T, FetchError>;
