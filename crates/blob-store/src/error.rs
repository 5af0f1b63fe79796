//! Error types for object store operations.

use thiserror::Error;

/// Errors that can occur when talking to the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the request (transport, auth, 5xx).
    #[error("object store unavailable: {0}")]
    Unavailable(String),

    /// The requested key does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The key or prefix is not acceptable.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The provided content checksum is malformed.
    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    /// The store is misconfigured (bad region, credentials, bucket name).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<s3::error::S3Error> for StoreError {
    fn from(err: s3::error::S3Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Result type for object store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
