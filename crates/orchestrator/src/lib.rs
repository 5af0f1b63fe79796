//! Inbound message pipeline for WADrive.
//!
//! This crate provides the [`Orchestrator`] type which turns a normalized
//! inbound chat message into backups, command replies and account changes.
//!
//! # Features
//!
//! - Creates an account for each new sender and welcomes them once
//! - Admits at most N attachment-carrying events per sender per hour
//! - Backs up attachments to an object store under a byte quota
//! - Answers `storage`, retrieval, `upgrade` and `help` commands
//! - Guards `delete account` behind an explicit confirmation
//!
//! # Architecture
//!
//! ```text
//! InboundEvent (from the webhook)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Resolve sender → Account (create on first contact)      │
//! │         ↓                                                   │
//! │  2. Welcome message if not yet onboarded                    │
//! │         ↓                                                   │
//! │  3a. Attachments present:                                   │
//! │     • rate limiter admits or rejects the whole event        │
//! │     • each attachment: download → quota → upload → record   │
//! │  3b. Otherwise, text present:                               │
//! │     • confirmation state machine → command → replies        │
//! │         ↓                                                   │
//! │  4. Replies via MessageSender                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use blob_store::MemoryObjectStore;
//! use orchestrator::{
//!     InMemoryRateLimiter, InboundEvent, LoggingSender, Orchestrator, PipelineConfig,
//!     StaticDownloader,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let database = database::Database::connect("sqlite::memory:").await?;
//!     database.migrate().await?;
//!
//!     let config = PipelineConfig::default();
//!     let orchestrator = Orchestrator::new(
//!         database,
//!         Arc::new(MemoryObjectStore::default()),
//!         Arc::new(StaticDownloader::new()),
//!         Arc::new(InMemoryRateLimiter::new(config.rate_limit_per_hour)),
//!         LoggingSender,
//!         &config,
//!     );
//!
//!     let report = orchestrator
//!         .handle(InboundEvent::text("+2348012345678", "storage"))
//!         .await?;
//!     println!("{:?}", report);
//!     Ok(())
//! }
//! ```

mod commands;
mod config;
mod download;
mod error;
mod event;
mod identity;
mod ingest;
mod locks;
mod media;
mod orchestrator;
mod rate_limit;
mod replies;
mod sender;

// Public exports
pub use commands::{
    normalize_command, Command, CommandAction, CommandInterpreter, CommandOutcome,
    ConfirmationState, Transition,
};
pub use config::PipelineConfig;
pub use download::{MediaDownloader, StaticDownloader};
pub use error::OrchestratorError;
pub use event::{InboundAttachment, InboundEvent};
pub use identity::{normalize_address, IdentityResolver};
pub use ingest::{IngestOutcome, IngestPipeline};
pub use locks::AccountLocks;
pub use media::{account_prefix, category_for, extension_for, normalize_mime, storage_key};
pub use orchestrator::{AttachmentReport, EventReport, Orchestrator};
pub use rate_limit::{InMemoryRateLimiter, RateLimiter, RateWindow};
pub use replies::Reply;
pub use sender::{LoggingSender, MessageSender, NoOpSender, RecordingSender, SentMessage};

/// Reply texts, for transports and tests that need to match them.
pub mod texts {
    pub use crate::replies::{
        backed_up, quota_exceeded, rate_limited, storage_summary, welcome, DELETE_CANCELLED_TEXT,
        DELETE_DONE_TEXT, DELETE_FAILED_TEXT, DELETE_PROMPT_TEXT, GENERIC_FAILURE_TEXT,
        HELP_TEXT, INGEST_FAILED_TEXT, UNKNOWN_COMMAND_TEXT, UPGRADE_TEXT,
    };
}

// Re-export commonly used types from dependencies
pub use database::{Account, MediaCategory, StoredFile};

#[cfg(test)]
pub(crate) mod test_support {
    use database::Database;

    /// Fresh migrated in-memory database. One connection, so every query sees the same data.
    pub async fn memory_database() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }
}
