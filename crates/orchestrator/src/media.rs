//! MIME classification and object key layout.

use database::MediaCategory;

/// Extension used when the MIME type is not in [`EXTENSIONS`].
pub const FALLBACK_EXTENSION: &str = "bin";

const CATEGORY_PREFIXES: &[(&str, MediaCategory)] = &[
    ("image/", MediaCategory::Image),
    ("video/", MediaCategory::Video),
    ("audio/", MediaCategory::Audio),
];

const EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("video/mp4", "mp4"),
    ("video/3gpp", "3gp"),
    ("audio/ogg", "ogg"),
    ("audio/mpeg", "mp3"),
    ("audio/aac", "aac"),
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
];

/// Lowercase the MIME type and drop parameters (`audio/ogg; codecs=opus` -> `audio/ogg`).
pub fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Category for a MIME type; anything unrecognized is a document.
pub fn category_for(mime_type: &str) -> MediaCategory {
    let mime = normalize_mime(mime_type);
    CATEGORY_PREFIXES
        .iter()
        .find(|(prefix, _)| mime.starts_with(prefix))
        .map(|(_, category)| *category)
        .unwrap_or(MediaCategory::Document)
}

/// File extension for a MIME type.
pub fn extension_for(mime_type: &str) -> &'static str {
    let mime = normalize_mime(mime_type);
    EXTENSIONS
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, ext)| *ext)
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Prefix shared by every object of an account.
pub fn account_prefix(account_id: &str) -> String {
    format!("accounts/{account_id}/")
}

/// Object key for a new file.
pub fn storage_key(account_id: &str, category: MediaCategory, file_id: &str, ext: &str) -> String {
    format!("{}{category}/{file_id}.{ext}", account_prefix(account_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(category_for("image/jpeg"), MediaCategory::Image);
        assert_eq!(category_for("VIDEO/MP4"), MediaCategory::Video);
        assert_eq!(category_for("audio/ogg; codecs=opus"), MediaCategory::Audio);
        assert_eq!(category_for("application/pdf"), MediaCategory::Document);
        assert_eq!(category_for("application/ogg"), MediaCategory::Document);
        assert_eq!(category_for(""), MediaCategory::Document);
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("audio/ogg; codecs=opus"), "ogg");
        assert_eq!(
            extension_for("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            "docx"
        );
        assert_eq!(extension_for("application/zip"), "bin");
    }

    #[test]
    fn keys_share_account_prefix() {
        let key = storage_key("acc-1", MediaCategory::Image, "f-1", "jpg");
        assert_eq!(key, "accounts/acc-1/image/f-1.jpg");
        assert!(key.starts_with(&account_prefix("acc-1")));
        assert!(!key.starts_with(&account_prefix("acc")));
    }
}
