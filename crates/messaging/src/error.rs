//! Error types for the messaging client.

use thiserror::Error;

/// Errors that can occur when talking to the messaging provider.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider API answered with an error.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// Media could not be fetched.
    #[error("Download failed: {0}")]
    Download(String),

    /// Webhook payload is missing fields or malformed.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;
