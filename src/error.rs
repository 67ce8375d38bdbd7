//! Error kinds for the canonicalization library.
//!
//! The pipeline itself is total over strings; the only ways a run can fail
//! are malformed input records, a failed provider fetch, or dataset I/O.

use thiserror::Error;

/// Failure obtaining raw records from the lyrics provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("provider rejected the access token (HTTP {0})")]
    Unauthorized(u16),

    #[error("provider rate limit exceeded")]
    RateLimited,

    #[error("artist not found: {0}")]
    ArtistNotFound(String),

    #[error("unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode provider response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum CanonError {
    /// A raw record is missing `title`/`lyrics` or holds a non-string value.
    #[error("input schema error at record {index}: {message}")]
    InputSchema { index: usize, message: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CanonError {
    pub fn schema(index: usize, message: impl Into<String>) -> Self {
        CanonError::InputSchema {
            index,
            message: message.into(),
        }
    }
}

pub type CanonResult<T> = Result<T, CanonError>;
