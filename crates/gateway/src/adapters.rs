//! Bridges between the pipeline's seams and the Twilio client.

use std::sync::Arc;

use async_trait::async_trait;
use messaging::MessagingClient;
use orchestrator::{MediaDownloader, MessageSender, OrchestratorError};
use tracing::debug;

/// Delivers replies over WhatsApp.
#[derive(Clone)]
pub struct WhatsAppSender {
    client: Arc<MessagingClient>,
}

impl WhatsAppSender {
    pub fn new(client: Arc<MessagingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageSender for WhatsAppSender {
    async fn send_text(&self, address: &str, body: &str) -> Result<(), OrchestratorError> {
        let result = self
            .client
            .send_text(address, body)
            .await
            .map_err(|e| OrchestratorError::SendFailed(e.to_string()))?;
        debug!(sid = %result.sid, "Text reply queued");
        Ok(())
    }

    async fn send_media(
        &self,
        address: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        let result = self
            .client
            .send_media(address, url, caption)
            .await
            .map_err(|e| OrchestratorError::SendFailed(e.to_string()))?;
        debug!(sid = %result.sid, "Media reply queued");
        Ok(())
    }
}

/// Fetches webhook media with the account credentials.
#[derive(Clone)]
pub struct WhatsAppDownloader {
    client: Arc<MessagingClient>,
}

impl WhatsAppDownloader {
    pub fn new(client: Arc<MessagingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaDownloader for WhatsAppDownloader {
    async fn download(&self, locator: &str) -> Result<Vec<u8>, OrchestratorError> {
        self.client
            .download_media(locator)
            .await
            .map_err(|e| OrchestratorError::Download(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messaging::TwilioConfig;

    fn unreachable_client() -> Arc<MessagingClient> {
        let config = TwilioConfig::new("AC123", "token", "+14155238886")
            .with_api_base_url("http://127.0.0.1:1");
        Arc::new(MessagingClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn send_errors_become_send_failed() {
        let sender = WhatsAppSender::new(unreachable_client());
        let err = sender.send_text("+15550100", "hi").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::SendFailed(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn download_errors_become_download() {
        let downloader = WhatsAppDownloader::new(unreachable_client());
        let err = downloader
            .download("http://127.0.0.1:1/media/ME1")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Download(_)));
    }
}
