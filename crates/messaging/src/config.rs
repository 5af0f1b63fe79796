//! Configuration types for the Twilio client.

use std::env;

use crate::error::{MessagingError, Result};

/// Default Twilio REST API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.twilio.com";

/// Credentials and endpoints for the Twilio WhatsApp channel.
#[derive(Clone)]
pub struct TwilioConfig {
    /// Account SID (e.g., "AC...").
    pub account_sid: String,
    /// Auth token; also the webhook signing key.
    pub auth_token: String,
    /// Sending number, with or without the `whatsapp:` prefix.
    pub from_number: String,
    /// REST API base URL.
    pub api_base_url: String,
}

impl TwilioConfig {
    /// Create a configuration against the public Twilio API.
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TWILIO_ACCOUNT_SID` | Account SID | (required) |
    /// | `TWILIO_AUTH_TOKEN` | Auth token | (required) |
    /// | `TWILIO_WHATSAPP_NUMBER` | Sending number | (required) |
    /// | `TWILIO_API_BASE_URL` | API base URL | `https://api.twilio.com` |
    pub fn from_env() -> Result<Self> {
        let config = Self::new(
            required("TWILIO_ACCOUNT_SID")?,
            required("TWILIO_AUTH_TOKEN")?,
            required("TWILIO_WHATSAPP_NUMBER")?,
        );

        Ok(match env::var("TWILIO_API_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => config.with_api_base_url(url),
            _ => config,
        })
    }

    fn account_base(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}",
            self.api_base_url.trim_end_matches('/'),
            self.account_sid
        )
    }

    /// Get the message creation endpoint URL.
    pub fn messages_url(&self) -> String {
        format!("{}/Messages.json", self.account_base())
    }

    /// Get the account resource URL, used as a credentials check.
    pub fn account_url(&self) -> String {
        format!("{}.json", self.account_base())
    }
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| MessagingError::Config(format!("{name} environment variable is required")))
}
