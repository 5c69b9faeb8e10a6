// Error types for benefits-hub.
// Covers GitHub API failures, persistence errors, and catalog loading.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("Invalid repository identifier: {0:?}")]
    InvalidRepo(String),

    #[error("Lookup timed out")]
    Timeout,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HubError>;
