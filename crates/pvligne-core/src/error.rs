//! Error types for the PV en Ligne core library.

use thiserror::Error;

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for mention lookups and configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure talking to the user-search endpoint
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("User search returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Endpoint answered 2xx with a body that is not a user list
    #[error("Malformed user search response: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
