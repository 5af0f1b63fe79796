//! Database models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A backup owner, identified by the sender address of the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Generated UUID.
    pub id: String,
    /// Sender address in E.164 form (e.g., "+2348012345678").
    pub address: String,
    /// Set once the welcome message has been sent.
    pub onboarded: bool,
    /// Bytes currently used.
    pub storage_used_bytes: i64,
    /// Byte ceiling for this account.
    pub storage_limit_bytes: i64,
    /// Whether a `delete account` request is waiting for confirmation.
    pub awaiting_delete_confirmation: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl Account {
    /// Bytes still available under the limit.
    pub fn remaining_bytes(&self) -> i64 {
        (self.storage_limit_bytes - self.storage_used_bytes).max(0)
    }

    /// Whether storing `additional` more bytes would exceed the limit.
    pub fn would_exceed(&self, additional: i64) -> bool {
        self.storage_used_bytes.saturating_add(additional) > self.storage_limit_bytes
    }
}

/// Category of a backed-up file, derived from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaCategory {
    /// All categories, in display order.
    pub const ALL: [MediaCategory; 4] = [
        MediaCategory::Image,
        MediaCategory::Video,
        MediaCategory::Audio,
        MediaCategory::Document,
    ];

    /// Storage name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "document" => Ok(Self::Document),
            other => Err(format!("unknown media category: {other}")),
        }
    }
}

/// Metadata for one backed-up object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoredFile {
    /// Generated UUID.
    pub id: String,
    /// Owning account.
    pub account_id: String,
    /// Derived category.
    pub category: MediaCategory,
    /// MIME type as declared by the provider.
    pub mime_type: String,
    /// Size of the stored object in bytes.
    pub size_bytes: i64,
    /// Filename shown to the user.
    pub original_name: String,
    /// Object key inside the bucket.
    pub storage_key: String,
    /// SHA-256 of the raw bytes, lowercase hex.
    pub content_checksum: String,
    /// Creation timestamp (ISO-8601, UTC).
    pub created_at: String,
}

/// Fields needed to record a freshly uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStoredFile {
    pub id: String,
    pub account_id: String,
    pub category: MediaCategory,
    pub mime_type: String,
    pub size_bytes: i64,
    pub original_name: String,
    pub storage_key: String,
    pub content_checksum: String,
}
