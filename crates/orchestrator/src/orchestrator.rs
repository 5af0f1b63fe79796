//! Main orchestrator that sequences inbound event handling.

use std::sync::Arc;

use blob_store::ObjectStore;
use database::{account, Database};
use tracing::{debug, error, info, warn};

use crate::commands::{CommandAction, CommandInterpreter};
use crate::config::PipelineConfig;
use crate::download::MediaDownloader;
use crate::error::OrchestratorError;
use crate::event::InboundEvent;
use crate::identity::{normalize_address, IdentityResolver};
use crate::ingest::{IngestOutcome, IngestPipeline};
use crate::locks::AccountLocks;
use crate::rate_limit::RateLimiter;
use crate::replies::{self, Reply};
use crate::sender::MessageSender;

/// What happened to one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentReport {
    Stored { file_id: String, size: i64 },
    QuotaExceeded { size: i64 },
    Failed { error: String },
}

/// Summary of one handled event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventReport {
    pub account_id: String,
    /// The welcome message was sent for this event.
    pub onboarded: bool,
    pub rate_limited: bool,
    pub attachments: Vec<AttachmentReport>,
    pub command: Option<CommandAction>,
    pub replies_sent: usize,
    pub replies_failed: usize,
}

/// Main orchestrator that coordinates inbound event processing.
///
/// Per event it:
/// - Resolves the sender to an account, creating it on first contact
/// - Sends the welcome message once
/// - Rate-limits and ingests attachments, one reply per attachment
/// - Otherwise interprets the text as a command
pub struct Orchestrator<S: MessageSender> {
    database: Database,
    identity: IdentityResolver,
    rate_limiter: Arc<dyn RateLimiter>,
    ingest: IngestPipeline,
    commands: CommandInterpreter,
    sender: S,
}

impl<S: MessageSender> Orchestrator<S> {
    /// Create a new orchestrator with the given components.
    pub fn new(
        database: Database,
        store: Arc<dyn ObjectStore>,
        downloader: Arc<dyn MediaDownloader>,
        rate_limiter: Arc<dyn RateLimiter>,
        sender: S,
        config: &PipelineConfig,
    ) -> Self {
        let locks = Arc::new(AccountLocks::new());

        Self {
            identity: IdentityResolver::new(database.clone(), config.free_tier_bytes),
            ingest: IngestPipeline::new(
                database.clone(),
                store.clone(),
                downloader,
                locks.clone(),
                config.transfer_timeout,
            ),
            commands: CommandInterpreter::new(
                database.clone(),
                store,
                locks,
                config.signed_url_expiry,
                config.retrieval_limit,
            ),
            database,
            rate_limiter,
            sender,
        }
    }

    /// Get the message sender.
    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Process an inbound event end-to-end.
    ///
    /// Only identity and onboarding persistence failures are returned as
    /// errors; everything after that degrades to a reply.
    pub async fn handle(&self, event: InboundEvent) -> Result<EventReport, OrchestratorError> {
        let address = normalize_address(&event.address).to_string();
        let (account, is_new) = self.identity.resolve(&address).await?;

        let mut report = EventReport {
            account_id: account.id.clone(),
            ..Default::default()
        };

        info!(
            account_id = %account.id,
            attachments = event.attachments.len(),
            has_text = !event.text.trim().is_empty(),
            "Processing inbound event"
        );

        if is_new || !account.onboarded {
            // Only the caller that flips the flag sends the welcome.
            if account::mark_onboarded(self.database.pool(), &account.id).await? {
                report.onboarded = true;
                let welcome = Reply::Text(replies::welcome(account.storage_limit_bytes));
                self.deliver(&address, &welcome, &mut report).await;
            }
        }

        if event.has_attachments() {
            if !self.rate_limiter.admit(&address).await {
                info!(account_id = %account.id, "Event rate limited");
                report.rate_limited = true;
                let notice = Reply::Text(replies::rate_limited(self.rate_limiter.limit()));
                self.deliver(&address, &notice, &mut report).await;
                return Ok(report);
            }

            for (index, attachment) in event.attachments.iter().enumerate() {
                let (entry, reply) = match self.ingest.ingest(&account.id, attachment).await {
                    Ok(outcome) => {
                        let reply = outcome.reply();
                        let entry = match outcome {
                            IngestOutcome::Stored { file, .. } => AttachmentReport::Stored {
                                file_id: file.id,
                                size: file.size_bytes,
                            },
                            IngestOutcome::QuotaExceeded { size, .. } => {
                                AttachmentReport::QuotaExceeded { size }
                            }
                        };
                        (entry, reply)
                    }
                    Err(e) => {
                        error!(account_id = %account.id, index, "Attachment failed: {}", e);
                        (
                            AttachmentReport::Failed {
                                error: e.to_string(),
                            },
                            replies::INGEST_FAILED_TEXT.to_string(),
                        )
                    }
                };
                report.attachments.push(entry);
                self.deliver(&address, &Reply::Text(reply), &mut report).await;
            }

            return Ok(report);
        }

        if event.text.trim().is_empty() {
            debug!(account_id = %account.id, "Nothing to do");
            return Ok(report);
        }

        match self.commands.handle(&account.id, &event.text).await {
            Ok(outcome) => {
                for reply in &outcome.replies {
                    self.deliver(&address, reply, &mut report).await;
                }
                report.command = Some(outcome.action);
            }
            Err(e) => {
                error!(account_id = %account.id, "Command failed: {}", e);
                self.deliver(&address, &Reply::text(replies::GENERIC_FAILURE_TEXT), &mut report)
                    .await;
            }
        }

        Ok(report)
    }

    async fn deliver(&self, address: &str, reply: &Reply, report: &mut EventReport) {
        match self.sender.send_reply(address, reply).await {
            Ok(()) => report.replies_sent += 1,
            Err(e) => {
                warn!("Failed to send reply to {}: {}", address, e);
                report.replies_failed += 1;
            }
        }
    }
}
