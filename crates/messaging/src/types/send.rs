//! Types for sending messages through the Twilio Messages API.

use serde::Deserialize;

use crate::address::to_channel;

/// Parameters for creating an outbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendParams {
    /// Recipient address (channel prefix optional).
    pub to: String,

    /// Message text; doubles as the caption when media is attached.
    pub body: Option<String>,

    /// Publicly reachable media URLs to attach.
    pub media_urls: Vec<String>,
}

impl SendParams {
    /// Create send params for a text message.
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: Some(body.into()),
            ..Default::default()
        }
    }

    /// Create send params for a media message without caption.
    pub fn media(to: impl Into<String>, media_url: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            media_urls: vec![media_url.into()],
            ..Default::default()
        }
    }

    /// Set the caption/body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a media URL.
    pub fn with_media(mut self, url: impl Into<String>) -> Self {
        self.media_urls.push(url.into());
        self
    }

    /// Encode as form fields. `MediaUrl` repeats once per attachment.
    pub fn to_form(&self, from: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![("From", to_channel(from)), ("To", to_channel(&self.to))];
        if let Some(body) = &self.body {
            form.push(("Body", body.clone()));
        }
        for url in &self.media_urls {
            form.push(("MediaUrl", url.clone()));
        }
        form
    }
}

/// Message resource returned after creation.
#[derive(Debug, Clone, Deserialize)]
pub struct SendResult {
    /// Message SID.
    pub sid: String,

    /// Delivery status (e.g., "queued").
    #[serde(default)]
    pub status: Option<String>,

    /// Error code reported by the provider, if any.
    #[serde(default)]
    pub error_code: Option<i64>,
}

/// Error body returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Account resource, as returned by the credentials check.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    /// Account SID.
    pub sid: String,
    /// Friendly name.
    #[serde(default)]
    pub friendly_name: Option<String>,
    /// Account status (e.g., "active").
    #[serde(default)]
    pub status: Option<String>,
}
