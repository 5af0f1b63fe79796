//! Twilio REST client.

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, info};

use crate::config::TwilioConfig;
use crate::error::{MessagingError, Result};
use crate::types::{AccountInfo, ApiErrorBody, SendParams, SendResult};

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Twilio WhatsApp channel.
#[derive(Clone)]
pub struct MessagingClient {
    http: Client,
    config: TwilioConfig,
}

impl MessagingClient {
    /// Create a client. No network calls are made.
    pub fn new(config: TwilioConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(MessagingError::Http)?;

        Ok(Self { http, config })
    }

    /// Create a client and verify the credentials against the account resource.
    pub async fn connect(config: TwilioConfig) -> Result<Self> {
        let client = Self::new(config)?;
        let account = client.fetch_account().await?;
        info!(
            "Connected to Twilio account {} ({})",
            account.sid,
            account.status.as_deref().unwrap_or("unknown")
        );
        Ok(client)
    }

    /// Fetch the account resource.
    pub async fn fetch_account(&self) -> Result<AccountInfo> {
        let url = self.config.account_url();
        debug!("Account check: {}", url);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Send a message using the full SendParams structure.
    pub async fn send(&self, params: SendParams) -> Result<SendResult> {
        let url = self.config.messages_url();
        let form = params.to_form(&self.config.from_number);
        debug!(to = %params.to, media = params.media_urls.len(), "Sending message");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        let response = Self::check(response).await?;
        let result: SendResult = response.json().await?;
        debug!(sid = %result.sid, "Message accepted");
        Ok(result)
    }

    /// Send a text message to a recipient.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<SendResult> {
        self.send(SendParams::text(to, body)).await
    }

    /// Send one media item with an optional caption.
    pub async fn send_media(
        &self,
        to: &str,
        media_url: &str,
        caption: Option<&str>,
    ) -> Result<SendResult> {
        let mut params = SendParams::media(to, media_url);
        if let Some(caption) = caption {
            params = params.with_body(caption);
        }
        self.send(params).await
    }

    /// Download the bytes behind a webhook media URL.
    ///
    /// Media URLs redirect to a CDN; redirects are followed.
    pub async fn download_media(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MessagingError::Download(format!("HTTP {status} for {url}")));
        }

        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "Media downloaded");
        Ok(bytes.to_vec())
    }

    /// Get the configuration.
    pub fn config(&self) -> &TwilioConfig {
        &self.config
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();
        let (code, message) = match parsed {
            Some(err) => (err.code, err.message.unwrap_or(body)),
            None => (None, body),
        };

        Err(MessagingError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

impl std::fmt::Debug for MessagingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingClient")
            .field("config", &self.config)
            .finish()
    }
}
