//! Text command parsing, the delete-confirmation state machine and command execution.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use blob_store::{ObjectStore, StoreError};
use database::{account, stored_file, Account, Database, DatabaseError, MediaCategory};
use tracing::{error, info, warn};

use crate::error::OrchestratorError;
use crate::locks::AccountLocks;
use crate::media::account_prefix;
use crate::replies::{self, Reply};

/// Trim, lowercase and collapse inner whitespace.
pub fn normalize_command(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A recognized text command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Storage,
    Show(MediaCategory),
    RecentFiles,
    DeleteAccount,
    Upgrade,
    Help,
    Unknown,
}

impl Command {
    /// Parse free text; unrecognized input is [`Command::Unknown`].
    pub fn parse(text: &str) -> Self {
        match normalize_command(text).as_str() {
            "storage" => Self::Storage,
            "show my photos" => Self::Show(MediaCategory::Image),
            "show my videos" => Self::Show(MediaCategory::Video),
            "show my audio" => Self::Show(MediaCategory::Audio),
            "show my files" | "show my documents" => Self::Show(MediaCategory::Document),
            "recent files" => Self::RecentFiles,
            "delete account" => Self::DeleteAccount,
            "upgrade" => Self::Upgrade,
            "help" => Self::Help,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage => f.write_str("storage"),
            Self::Show(category) => write!(f, "show {category}"),
            Self::RecentFiles => f.write_str("recent files"),
            Self::DeleteAccount => f.write_str("delete account"),
            Self::Upgrade => f.write_str("upgrade"),
            Self::Help => f.write_str("help"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Where an account stands in the delete-confirmation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationState {
    Normal,
    AwaitingConfirm,
    /// Terminal; the account no longer exists.
    Deleted,
}

/// What a state transition asks the interpreter to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Execute(Command),
    RequestConfirmation,
    Confirm,
    Cancel,
    Ignore,
}

impl ConfirmationState {
    /// State recorded on an account.
    pub fn of(account: &Account) -> Self {
        if account.awaiting_delete_confirmation {
            Self::AwaitingConfirm
        } else {
            Self::Normal
        }
    }

    /// Next state and the effect to run for `text`.
    pub fn next(self, text: &str) -> (Self, Transition) {
        match self {
            Self::Normal => match Command::parse(text) {
                Command::DeleteAccount => (Self::AwaitingConfirm, Transition::RequestConfirmation),
                command => (Self::Normal, Transition::Execute(command)),
            },
            Self::AwaitingConfirm => {
                if normalize_command(text) == "yes" {
                    (Self::Deleted, Transition::Confirm)
                } else {
                    (Self::Normal, Transition::Cancel)
                }
            }
            Self::Deleted => (Self::Deleted, Transition::Ignore),
        }
    }
}

/// What handling a text did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    Executed(Command),
    ConfirmationRequested,
    DeletionCancelled,
    AccountDeleted { objects: u64, files: u64 },
    DeletionFailed,
}

/// Replies produced for one text, plus what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub action: CommandAction,
    pub replies: Vec<Reply>,
}

impl CommandOutcome {
    fn new(action: CommandAction, replies: Vec<Reply>) -> Self {
        Self { action, replies }
    }
}

/// Executes text commands against an account.
pub struct CommandInterpreter {
    database: Database,
    store: Arc<dyn ObjectStore>,
    locks: Arc<AccountLocks>,
    signed_url_expiry: Duration,
    retrieval_limit: i64,
}

impl CommandInterpreter {
    pub fn new(
        database: Database,
        store: Arc<dyn ObjectStore>,
        locks: Arc<AccountLocks>,
        signed_url_expiry: Duration,
        retrieval_limit: i64,
    ) -> Self {
        Self {
            database,
            store,
            locks,
            signed_url_expiry,
            retrieval_limit,
        }
    }

    /// Handle one text message from `account_id`.
    ///
    /// The confirmation transition runs under the account lock against a
    /// freshly read account. Read-only commands run after the lock is released.
    pub async fn handle(
        &self,
        account_id: &str,
        text: &str,
    ) -> Result<CommandOutcome, OrchestratorError> {
        let guard = self.locks.lock(account_id).await;
        let account = account::get_account(self.database.pool(), account_id).await?;
        let (_, transition) = ConfirmationState::of(&account).next(text);

        match transition {
            Transition::RequestConfirmation => {
                account::set_awaiting_delete_confirmation(self.database.pool(), account_id, true)
                    .await?;
                info!(account_id, "Account deletion requested");
                Ok(CommandOutcome::new(
                    CommandAction::ConfirmationRequested,
                    vec![Reply::text(replies::DELETE_PROMPT_TEXT)],
                ))
            }
            Transition::Cancel => {
                account::set_awaiting_delete_confirmation(self.database.pool(), account_id, false)
                    .await?;
                info!(account_id, "Account deletion cancelled");
                Ok(CommandOutcome::new(
                    CommandAction::DeletionCancelled,
                    vec![Reply::text(replies::DELETE_CANCELLED_TEXT)],
                ))
            }
            Transition::Confirm => {
                let result = self.delete_everything(account_id).await;
                drop(guard);
                match result {
                    Ok((objects, files)) => {
                        self.locks.remove(account_id).await;
                        Ok(CommandOutcome::new(
                            CommandAction::AccountDeleted { objects, files },
                            vec![Reply::text(replies::DELETE_DONE_TEXT)],
                        ))
                    }
                    Err(e) => {
                        error!(account_id, "Account deletion failed: {}", e);
                        Ok(CommandOutcome::new(
                            CommandAction::DeletionFailed,
                            vec![Reply::text(replies::DELETE_FAILED_TEXT)],
                        ))
                    }
                }
            }
            Transition::Execute(command) => {
                drop(guard);
                let replies = self.execute(&account, command).await?;
                Ok(CommandOutcome::new(CommandAction::Executed(command), replies))
            }
            Transition::Ignore => Ok(CommandOutcome::new(
                CommandAction::Executed(Command::Unknown),
                Vec::new(),
            )),
        }
    }

    /// Remove every object and then the account row. Safe to retry.
    async fn delete_everything(&self, account_id: &str) -> Result<(u64, u64), OrchestratorError> {
        let objects = self.store.delete_prefix(&account_prefix(account_id)).await?;
        let files = match account::delete_account(self.database.pool(), account_id).await {
            Ok(files) => files,
            Err(DatabaseError::NotFound { .. }) => 0,
            Err(e) => return Err(e.into()),
        };
        info!(account_id, objects, files, "Account deleted");
        Ok((objects, files))
    }

    async fn execute(
        &self,
        account: &Account,
        command: Command,
    ) -> Result<Vec<Reply>, OrchestratorError> {
        let replies = match command {
            Command::Storage => vec![Reply::Text(replies::storage_summary(
                account.storage_used_bytes,
                account.storage_limit_bytes,
            ))],
            Command::Show(category) => self.retrieve(account, Some(category)).await?,
            Command::RecentFiles => self.retrieve(account, None).await?,
            Command::Upgrade => vec![Reply::text(replies::UPGRADE_TEXT)],
            Command::Help => vec![Reply::text(replies::HELP_TEXT)],
            // Reached only through the state machine.
            Command::DeleteAccount | Command::Unknown => {
                vec![Reply::text(replies::UNKNOWN_COMMAND_TEXT)]
            }
        };
        Ok(replies)
    }

    async fn retrieve(
        &self,
        account: &Account,
        category: Option<MediaCategory>,
    ) -> Result<Vec<Reply>, OrchestratorError> {
        let files = stored_file::list_recent(
            self.database.pool(),
            &account.id,
            category,
            self.retrieval_limit,
        )
        .await?;

        if files.is_empty() {
            return Ok(vec![Reply::Text(replies::no_files(category))]);
        }

        let mut out = Vec::with_capacity(files.len() + 1);
        out.push(Reply::Text(replies::retrieval_header(files.len())));

        for file in &files {
            match self
                .store
                .presigned_url(&file.storage_key, self.signed_url_expiry)
                .await
            {
                Ok(url) => out.push(Reply::Media {
                    url,
                    caption: Some(replies::file_caption(file)),
                }),
                Err(StoreError::NotFound(key)) => {
                    warn!(file_id = %file.id, key = %key, "Stored object missing");
                    out.push(Reply::Text(replies::broken_link(file)));
                }
                Err(e) => {
                    warn!(file_id = %file.id, "Failed to presign: {}", e);
                    out.push(Reply::Text(replies::link_failed(file)));
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_database;
    use blob_store::MemoryObjectStore;
    use database::NewStoredFile;

    #[test]
    fn normalization() {
        assert_eq!(normalize_command("  Show   MY\tPhotos \n"), "show my photos");
    }

    #[test]
    fn parsing() {
        assert_eq!(Command::parse("STORAGE"), Command::Storage);
        assert_eq!(Command::parse("show my photos"), Command::Show(MediaCategory::Image));
        assert_eq!(Command::parse("show my files"), Command::Show(MediaCategory::Document));
        assert_eq!(
            Command::parse("show  my documents"),
            Command::Show(MediaCategory::Document)
        );
        assert_eq!(Command::parse("Recent Files"), Command::RecentFiles);
        assert_eq!(Command::parse("delete account"), Command::DeleteAccount);
        assert_eq!(Command::parse("yes"), Command::Unknown);
        assert_eq!(Command::parse("hello"), Command::Unknown);
    }

    #[test]
    fn transitions() {
        use ConfirmationState::*;
        assert_eq!(
            Normal.next("Delete Account"),
            (AwaitingConfirm, Transition::RequestConfirmation)
        );
        assert_eq!(
            Normal.next("help"),
            (Normal, Transition::Execute(Command::Help))
        );
        assert_eq!(AwaitingConfirm.next(" YES "), (Deleted, Transition::Confirm));
        assert_eq!(AwaitingConfirm.next("no"), (Normal, Transition::Cancel));
        // Commands are not executed while confirmation is pending.
        assert_eq!(AwaitingConfirm.next("storage"), (Normal, Transition::Cancel));
        assert_eq!(Deleted.next("yes"), (Deleted, Transition::Ignore));
    }

    struct Fixture {
        db: Database,
        store: Arc<MemoryObjectStore>,
        interpreter: CommandInterpreter,
    }

    async fn fixture() -> Fixture {
        let db = memory_database().await;
        let store = Arc::new(MemoryObjectStore::new("test").with_page_size(2));
        let interpreter = CommandInterpreter::new(
            db.clone(),
            store.clone(),
            Arc::new(AccountLocks::new()),
            Duration::from_secs(3600),
            10,
        );
        account::create_account(db.pool(), "acc-1", "+15550200", 10_000)
            .await
            .unwrap();
        Fixture {
            db,
            store,
            interpreter,
        }
    }

    async fn add_file(f: &Fixture, id: &str, category: MediaCategory) {
        let key = format!("accounts/acc-1/{category}/{id}.bin");
        f.store.upload(&key, id.as_bytes(), "application/octet-stream").await.unwrap();
        stored_file::record_upload(
            f.db.pool(),
            &NewStoredFile {
                id: id.to_string(),
                account_id: "acc-1".to_string(),
                category,
                mime_type: "application/octet-stream".to_string(),
                size_bytes: id.len() as i64,
                original_name: format!("{id}.bin"),
                storage_key: key,
                content_checksum: "00".repeat(32),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn storage_reports_usage() {
        let f = fixture().await;
        let outcome = f.interpreter.handle("acc-1", "storage").await.unwrap();
        assert_eq!(outcome.action, CommandAction::Executed(Command::Storage));
        assert!(outcome.replies[0].as_text().unwrap().contains("0%"));
    }

    #[tokio::test]
    async fn retrieval_filters_and_captions() {
        let f = fixture().await;
        add_file(&f, "p1", MediaCategory::Image).await;
        add_file(&f, "d1", MediaCategory::Document).await;
        add_file(&f, "p2", MediaCategory::Image).await;

        let outcome = f.interpreter.handle("acc-1", "show my photos").await.unwrap();
        assert_eq!(outcome.replies.len(), 3);
        assert_eq!(outcome.replies[0].as_text(), Some("📂 Sending you 2 files..."));
        let Reply::Media { url, caption } = &outcome.replies[1] else {
            panic!("expected media reply");
        };
        assert!(url.contains("/image/p2.bin"));
        assert!(caption.as_deref().unwrap().starts_with("📄 p2.bin\n📅 "));
    }

    #[tokio::test]
    async fn retrieval_empty_and_broken_link() {
        let f = fixture().await;
        let outcome = f.interpreter.handle("acc-1", "show my videos").await.unwrap();
        assert_eq!(
            outcome.replies,
            vec![Reply::Text(replies::no_files(Some(MediaCategory::Video)))]
        );

        add_file(&f, "a1", MediaCategory::Audio).await;
        f.store.delete_object("accounts/acc-1/audio/a1.bin").await.unwrap();
        let outcome = f.interpreter.handle("acc-1", "show my audio").await.unwrap();
        assert_eq!(outcome.replies.len(), 2);
        assert!(outcome.replies[1].as_text().unwrap().contains("a1.bin is missing"));
    }

    #[tokio::test]
    async fn delete_then_cancel_keeps_data() {
        let f = fixture().await;
        add_file(&f, "p1", MediaCategory::Image).await;

        let outcome = f.interpreter.handle("acc-1", "delete account").await.unwrap();
        assert_eq!(outcome.action, CommandAction::ConfirmationRequested);
        assert!(account::get_account(f.db.pool(), "acc-1").await.unwrap().awaiting_delete_confirmation);

        let outcome = f.interpreter.handle("acc-1", "no").await.unwrap();
        assert_eq!(outcome.action, CommandAction::DeletionCancelled);
        let account = account::get_account(f.db.pool(), "acc-1").await.unwrap();
        assert!(!account.awaiting_delete_confirmation);
        assert_eq!(stored_file::count_for_account(f.db.pool(), "acc-1").await.unwrap(), 1);
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn confirmed_delete_removes_everything() {
        let f = fixture().await;
        for id in ["p1", "p2", "v1", "d1", "d2"] {
            let category = match &id[..1] {
                "p" => MediaCategory::Image,
                "v" => MediaCategory::Video,
                _ => MediaCategory::Document,
            };
            add_file(&f, id, category).await;
        }

        f.interpreter.handle("acc-1", "delete account").await.unwrap();
        let outcome = f.interpreter.handle("acc-1", "Yes").await.unwrap();
        assert_eq!(
            outcome.action,
            CommandAction::AccountDeleted {
                objects: 5,
                files: 5
            }
        );
        assert!(account::find_account(f.db.pool(), "acc-1").await.unwrap().is_none());
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn failed_delete_keeps_flag_and_retry_converges() {
        let f = fixture().await;
        for id in ["p1", "p2", "p3"] {
            add_file(&f, id, MediaCategory::Image).await;
        }
        f.interpreter.handle("acc-1", "delete account").await.unwrap();

        f.store.set_delete_budget(Some(1));
        let outcome = f.interpreter.handle("acc-1", "yes").await.unwrap();
        assert_eq!(outcome.action, CommandAction::DeletionFailed);
        let account = account::get_account(f.db.pool(), "acc-1").await.unwrap();
        assert!(account.awaiting_delete_confirmation);

        f.store.set_delete_budget(None);
        let outcome = f.interpreter.handle("acc-1", "yes").await.unwrap();
        assert!(matches!(outcome.action, CommandAction::AccountDeleted { objects: 2, files: 3 }));
        assert!(f.store.is_empty().await);
    }
}
