//! Error types for orchestrator operations.

use blob_store::StoreError;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while handling an inbound event.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Persistence failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Object store request failed.
    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    /// Media download failed.
    #[error("download failed: {0}")]
    Download(String),

    /// A transfer did not finish in time.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    /// Message sending failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The event cannot be processed.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

impl OrchestratorError {
    /// Whether the failure came from a network transfer rather than persistence.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Unavailable(_))
                | Self::Download(_)
                | Self::Timeout { .. }
                | Self::SendFailed(_)
        )
    }
}
