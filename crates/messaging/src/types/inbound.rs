//! Inbound webhook payload.

use std::collections::HashMap;

use crate::address::strip_channel;
use crate::error::{MessagingError, Result};

/// Most attachments the provider puts in one message.
pub const MAX_MEDIA: usize = 10;

/// One attachment announced by a webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMedia {
    /// Provider URL the bytes can be fetched from (requires basic auth).
    pub url: String,
    /// Declared MIME type.
    pub content_type: String,
}

/// A parsed incoming WhatsApp message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender address without the channel prefix.
    pub from: String,
    /// Message text; empty when only media was sent.
    pub body: String,
    /// Provider message SID, if present.
    pub message_sid: Option<String>,
    /// Sender's display name, if present.
    pub profile_name: Option<String>,
    /// Attachments in the order the provider listed them.
    pub media: Vec<InboundMedia>,
}

impl InboundMessage {
    /// Parse the form fields of a webhook request.
    ///
    /// Requires `From`. `NumMedia` defaults to zero and may not exceed
    /// [`MAX_MEDIA`]; an attachment with a missing URL is rejected, a missing
    /// content type falls back to `application/octet-stream`.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self> {
        let from = form
            .get("From")
            .map(|v| strip_channel(v))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| MessagingError::InvalidPayload("missing From".to_string()))?
            .to_string();

        let num_media = match form.get("NumMedia").map(|v| v.trim()) {
            None | Some("") => 0,
            Some(n) => n
                .parse::<usize>()
                .ok()
                .filter(|count| *count <= MAX_MEDIA)
                .ok_or_else(|| {
                    MessagingError::InvalidPayload(format!("invalid NumMedia: {n}"))
                })?,
        };

        let mut media = Vec::with_capacity(num_media);
        for i in 0..num_media {
            let url = form
                .get(&format!("MediaUrl{i}"))
                .filter(|v| !v.is_empty())
                .ok_or_else(|| MessagingError::InvalidPayload(format!("missing MediaUrl{i}")))?
                .clone();
            let content_type = form
                .get(&format!("MediaContentType{i}"))
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| "application/octet-stream".to_string());
            media.push(InboundMedia { url, content_type });
        }

        Ok(Self {
            from,
            body: form.get("Body").cloned().unwrap_or_default(),
            message_sid: form.get("MessageSid").cloned(),
            profile_name: form.get("ProfileName").cloned(),
            media,
        })
    }

    /// Whether the message carries attachments.
    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }
}
