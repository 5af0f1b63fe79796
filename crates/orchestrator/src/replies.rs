//! User-facing reply texts.

use chrono::DateTime;
use database::{MediaCategory, StoredFile};

/// One outbound reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Media { url: String, caption: Option<String> },
}

impl Reply {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(body.into())
    }

    /// Body of a text reply.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(body) => Some(body),
            Self::Media { .. } => None,
        }
    }
}

/// Help text shown when user asks for help.
pub const HELP_TEXT: &str = "🤖 *WADrive Commands*

📁 *Backup*
Simply forward any file, photo, video, voice note, or document to this chat.

📋 *Retrieve*
• `show my photos` — Get your backed-up images
• `show my videos` — Get your backed-up videos
• `show my audio` — Get your voice notes & audio files
• `show my files` — Get your documents
• `recent files` — Get your 10 most recent uploads

💾 *Account*
• `storage` — View your storage usage
• `delete account` — Permanently delete all your data

❓ *Help*
• `help` — Show this menu";

pub const UPGRADE_TEXT: &str = "✨ *WADrive Pro — 20GB for ₦1,500/month*

Get 40× more storage, plus:
• Priority backup
• Smart search (coming soon)

To upgrade, visit: https://wadrive.app/upgrade
(Payments coming soon inside WhatsApp!)";

pub const DELETE_PROMPT_TEXT: &str = "⚠️ *Are you sure?*

This will permanently delete *all* your backed-up files and your account. This cannot be undone.

Reply *YES* to confirm, or anything else to cancel.";

pub const DELETE_CANCELLED_TEXT: &str = "✅ Deletion cancelled. Your data is safe.";

pub const DELETE_DONE_TEXT: &str = "🗑️ Done. All your files and account data have been permanently deleted.

Sorry to see you go. If you ever want to come back, just say hi! 👋";

pub const UNKNOWN_COMMAND_TEXT: &str =
    "I didn't understand that. Type *help* to see available commands, or forward a file to back it up! 😊";

pub const GENERIC_FAILURE_TEXT: &str =
    "😕 Something went wrong on our side. Please try again in a moment.";

pub const DELETE_FAILED_TEXT: &str = "😕 We couldn't finish deleting your data. Nothing is lost; reply *YES* to try again, or anything else to cancel.";

pub const INGEST_FAILED_TEXT: &str =
    "⚠️ We couldn't back up that file. Please try sending it again.";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn mb(bytes: i64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

fn kb(bytes: i64) -> f64 {
    bytes as f64 / 1024.0
}

/// Percentage of the limit in use, rounded and capped at 100.
pub fn usage_percent(used: i64, limit: i64) -> u32 {
    if limit <= 0 {
        return 100;
    }
    let pct = (used as f64 / limit as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// Ten-segment usage bar.
pub fn usage_bar(pct: u32) -> String {
    let filled = ((pct as f64 / 10.0).round() as usize).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Sent once, on first contact. Names the account's quota.
pub fn welcome(limit: i64) -> String {
    format!(
        "👋 Welcome to *WADrive* — Storage Made Easy!\n\n\
         I'll keep your photos, videos, voice notes, and documents safe in the cloud. \
         Simply forward anything you want to back up here.\n\n\
         🔒 *Privacy*: Your files are stored privately and only you can access them.\n\
         📦 *Free Storage*: You get {:.0}MB free to start.\n\n\
         To get started, just forward a file!\n\
         Type *help* anytime to see all available commands.",
        mb(limit)
    )
}

pub fn rate_limited(limit: u32) -> String {
    format!("⚠️ You're uploading too fast! Please slow down — max {limit} files per hour.")
}

pub fn quota_exceeded(used: i64, limit: i64) -> String {
    format!(
        "⚠️ Storage full! You've used {:.1} MB of {:.0} MB.\n\n\
         To continue backing up files, you'll need to upgrade your plan.\n\
         Reply *upgrade* to learn about our Pro plan (20GB for ₦1,500/month).",
        mb(used),
        mb(limit)
    )
}

pub fn backed_up(filename: &str, size: i64, used: i64, limit: i64) -> String {
    format!(
        "☁️ *Backed up securely!*\n📄 {} ({:.1} KB)\n📦 Storage: {:.1} MB / {:.0} MB",
        filename,
        kb(size),
        mb(used),
        mb(limit)
    )
}

pub fn storage_summary(used: i64, limit: i64) -> String {
    let pct = usage_percent(used, limit);
    let mut msg = format!(
        "📦 *Your WADrive Storage*\n\nUsed: {:.1} MB of {:.0} MB\n[{}] {}%\nRemaining: {:.1} MB",
        mb(used),
        mb(limit),
        usage_bar(pct),
        pct,
        mb((limit - used).max(0))
    );
    if pct >= 90 {
        msg.push_str("\n\n⚠️ You're almost full! Reply *upgrade* to get 20GB for ₦1,500/month.");
    }
    msg
}

pub fn retrieval_header(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("📂 Sending you {count} file{plural}...")
}

/// What the user calls a category in retrieval replies.
pub fn kind_name(category: Option<MediaCategory>) -> &'static str {
    match category {
        Some(MediaCategory::Image) => "photos",
        Some(MediaCategory::Video) => "videos",
        Some(MediaCategory::Audio) => "audio",
        Some(MediaCategory::Document) => "documents",
        None => "files",
    }
}

pub fn no_files(category: Option<MediaCategory>) -> String {
    format!(
        "📭 You have no backed-up {} yet. Forward some to this chat!",
        kind_name(category)
    )
}

/// `dd/mm/yyyy`, or the raw timestamp if it cannot be parsed.
pub fn display_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

pub fn file_caption(file: &StoredFile) -> String {
    format!(
        "📄 {}\n📅 {} · 💾 {:.1} KB",
        file.original_name,
        display_date(&file.created_at),
        kb(file.size_bytes)
    )
}

pub fn broken_link(file: &StoredFile) -> String {
    format!(
        "⚠️ {} is missing from storage and can't be sent.",
        file.original_name
    )
}

pub fn link_failed(file: &StoredFile) -> String {
    format!(
        "⚠️ Couldn't prepare {} right now. Please try again later.",
        file.original_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: i64 = 1024 * 1024;

    #[test]
    fn percent_rounds_and_caps() {
        assert_eq!(usage_percent(10 * MB, 500 * MB), 2);
        assert_eq!(usage_percent(0, 500 * MB), 0);
        assert_eq!(usage_percent(500 * MB, 500 * MB), 100);
        assert_eq!(usage_percent(600 * MB, 500 * MB), 100);
        assert_eq!(usage_percent(1, 0), 100);
    }

    #[test]
    fn welcome_names_the_quota() {
        let text = welcome(500 * MB);
        assert!(text.contains("You get 500MB free to start."));
        assert!(text.contains("back up here.\n\n🔒 *Privacy*"));
        assert!(welcome(2048 * MB).contains("You get 2048MB free"));
    }

    #[test]
    fn bar_segments() {
        assert_eq!(usage_bar(2), "░░░░░░░░░░");
        assert_eq!(usage_bar(45), "█████░░░░░");
        assert_eq!(usage_bar(100), "██████████");
    }

    #[test]
    fn storage_summary_nudges_when_nearly_full() {
        let low = storage_summary(10 * MB, 500 * MB);
        assert!(low.contains("Used: 10.0 MB of 500 MB"));
        assert!(low.contains("[░░░░░░░░░░] 2%"));
        assert!(low.contains("Remaining: 490.0 MB"));
        assert!(!low.contains("almost full"));

        let high = storage_summary(450 * MB, 500 * MB);
        assert!(high.contains("90%"));
        assert!(high.contains("almost full"));
    }

    #[test]
    fn backed_up_formats_sizes() {
        let text = backed_up("photo.jpg", 10 * MB, 10 * MB, 500 * MB);
        assert!(text.contains("📄 photo.jpg (10240.0 KB)"));
        assert!(text.contains("📦 Storage: 10.0 MB / 500 MB"));
    }

    #[test]
    fn quota_text_names_usage() {
        let text = quota_exceeded(499 * MB, 500 * MB);
        assert!(text.starts_with("⚠️ Storage full! You've used 499.0 MB of 500 MB."));
        assert!(text.contains("*upgrade*"));
    }

    #[test]
    fn retrieval_texts() {
        assert_eq!(retrieval_header(1), "📂 Sending you 1 file...");
        assert_eq!(retrieval_header(3), "📂 Sending you 3 files...");
        assert_eq!(
            no_files(Some(MediaCategory::Video)),
            "📭 You have no backed-up videos yet. Forward some to this chat!"
        );
        assert!(no_files(None).contains("backed-up files"));
    }

    #[test]
    fn dates() {
        assert_eq!(display_date("2026-03-07T09:15:00.123Z"), "07/03/2026");
        assert_eq!(display_date("yesterday"), "yesterday");
    }

    #[test]
    fn rate_limit_names_limit() {
        assert!(rate_limited(5).contains("max 5 files per hour"));
    }
}
