//! Media ingestion: download, classify, upload, account.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use blob_store::{ContentChecksum, ObjectStore};
use database::{account, stored_file, Account, Database, DatabaseError, NewStoredFile, StoredFile};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::download::MediaDownloader;
use crate::error::OrchestratorError;
use crate::event::InboundAttachment;
use crate::locks::AccountLocks;
use crate::media::{category_for, extension_for, normalize_mime, storage_key};
use crate::replies;

/// Result of ingesting one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The object is stored and charged to the account.
    Stored { file: StoredFile, account: Account },
    /// The attachment would not fit; nothing was stored.
    QuotaExceeded { account: Account, size: i64 },
}

impl IngestOutcome {
    /// Text reply describing the outcome.
    pub fn reply(&self) -> String {
        match self {
            Self::Stored { file, account } => replies::backed_up(
                &file.original_name,
                file.size_bytes,
                account.storage_used_bytes,
                account.storage_limit_bytes,
            ),
            Self::QuotaExceeded { account, .. } => {
                replies::quota_exceeded(account.storage_used_bytes, account.storage_limit_bytes)
            }
        }
    }
}

/// Runs attachments through download, quota check, upload and accounting.
pub struct IngestPipeline {
    database: Database,
    store: Arc<dyn ObjectStore>,
    downloader: Arc<dyn MediaDownloader>,
    locks: Arc<AccountLocks>,
    transfer_timeout: Duration,
}

impl IngestPipeline {
    pub fn new(
        database: Database,
        store: Arc<dyn ObjectStore>,
        downloader: Arc<dyn MediaDownloader>,
        locks: Arc<AccountLocks>,
        transfer_timeout: Duration,
    ) -> Self {
        Self {
            database,
            store,
            downloader,
            locks,
            transfer_timeout,
        }
    }

    /// Ingest one attachment for `account_id`.
    ///
    /// Transfers run outside the account lock. The quota is checked before
    /// uploading and enforced again by the finalizing transaction. The object
    /// is removed again whenever the upload or the finalizing step fails.
    pub async fn ingest(
        &self,
        account_id: &str,
        attachment: &InboundAttachment,
    ) -> Result<IngestOutcome, OrchestratorError> {
        let bytes = self
            .bounded("download", self.downloader.download(&attachment.locator))
            .await?;
        let size = i64::try_from(bytes.len())
            .map_err(|_| OrchestratorError::InvalidEvent("attachment too large".into()))?;

        {
            let _guard = self.locks.lock(account_id).await;
            let current = account::get_account(self.database.pool(), account_id).await?;
            if current.would_exceed(size) {
                info!(
                    account_id,
                    size,
                    used = current.storage_used_bytes,
                    "Attachment rejected by quota"
                );
                return Ok(IngestOutcome::QuotaExceeded {
                    account: current,
                    size,
                });
            }
        }

        let mime_type = normalize_mime(&attachment.mime_type);
        let category = category_for(&mime_type);
        let ext = extension_for(&mime_type);
        let checksum = ContentChecksum::compute(&bytes);
        let file_id = Uuid::new_v4().to_string();
        let key = storage_key(account_id, category, &file_id, ext);
        let original_name = attachment
            .filename
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{file_id}.{ext}"));

        let uploaded = self
            .bounded("upload", async {
                self.store
                    .upload(&key, &bytes, &mime_type)
                    .await
                    .map_err(OrchestratorError::from)
            })
            .await;
        if let Err(e) = uploaded {
            // A timed-out or failed request may still have stored the object.
            self.discard(&key).await;
            return Err(e);
        }
        debug!(account_id, key = %key, size, "Uploaded attachment");

        let record = NewStoredFile {
            id: file_id,
            account_id: account_id.to_string(),
            category,
            mime_type,
            size_bytes: size,
            original_name,
            storage_key: key.clone(),
            content_checksum: checksum.to_hex(),
        };

        let _guard = self.locks.lock(account_id).await;
        match stored_file::record_upload(self.database.pool(), &record).await {
            Ok((file, account)) => {
                info!(
                    account_id,
                    file_id = %file.id,
                    size,
                    used = account.storage_used_bytes,
                    "Attachment backed up"
                );
                Ok(IngestOutcome::Stored { file, account })
            }
            Err(DatabaseError::QuotaExceeded { .. }) => {
                self.discard(&key).await;
                let current = account::get_account(self.database.pool(), account_id).await?;
                info!(account_id, size, "Quota consumed concurrently, upload discarded");
                Ok(IngestOutcome::QuotaExceeded {
                    account: current,
                    size,
                })
            }
            Err(e) => {
                self.discard(&key).await;
                Err(e.into())
            }
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, OrchestratorError>
    where
        F: Future<Output = Result<T, OrchestratorError>>,
    {
        tokio::time::timeout(self.transfer_timeout, fut)
            .await
            .map_err(|_| OrchestratorError::Timeout {
                operation,
                seconds: self.transfer_timeout.as_secs(),
            })?
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.store.delete_object(key).await {
            warn!(key, "Failed to remove orphaned object: {}", e);
        }
    }
}
