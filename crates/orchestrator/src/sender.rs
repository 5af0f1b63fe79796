//! Message sender trait and implementations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::OrchestratorError;
use crate::replies::Reply;

/// Trait for delivering replies to a sender.
///
/// Abstracted to support different transports (WhatsApp, tests, etc.)
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a text message.
    ///
    /// # Arguments
    /// * `address` - Recipient address without channel prefix
    /// * `body` - Message content
    async fn send_text(&self, address: &str, body: &str) -> Result<(), OrchestratorError>;

    /// Send a media message.
    ///
    /// # Arguments
    /// * `address` - Recipient address without channel prefix
    /// * `url` - Publicly fetchable media URL
    /// * `caption` - Optional caption shown under the media
    async fn send_media(
        &self,
        address: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<(), OrchestratorError>;

    /// Send a [`Reply`] (convenience wrapper).
    async fn send_reply(&self, address: &str, reply: &Reply) -> Result<(), OrchestratorError> {
        match reply {
            Reply::Text(body) => self.send_text(address, body).await,
            Reply::Media { url, caption } => {
                self.send_media(address, url, caption.as_deref()).await
            }
        }
    }
}

/// A no-op message sender for testing that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpSender;

#[async_trait]
impl MessageSender for NoOpSender {
    async fn send_text(&self, _address: &str, _body: &str) -> Result<(), OrchestratorError> {
        Ok(())
    }

    async fn send_media(
        &self,
        _address: &str,
        _url: &str,
        _caption: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

/// A logging message sender for debugging that logs all operations.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl MessageSender for LoggingSender {
    async fn send_text(&self, address: &str, body: &str) -> Result<(), OrchestratorError> {
        tracing::info!("Sending text to {}: {}", address, body);
        Ok(())
    }

    async fn send_media(
        &self,
        address: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        tracing::info!(
            "Sending media to {}: {} ({})",
            address,
            url,
            caption.unwrap_or("no caption")
        );
        Ok(())
    }
}

/// Shared senders, so one transport can be handed out as `Arc<dyn MessageSender>`.
#[async_trait]
impl<T: MessageSender + ?Sized> MessageSender for Arc<T> {
    async fn send_text(&self, address: &str, body: &str) -> Result<(), OrchestratorError> {
        (**self).send_text(address, body).await
    }

    async fn send_media(
        &self,
        address: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        (**self).send_media(address, url, caption).await
    }
}

/// A reply captured by [`RecordingSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub address: String,
    pub reply: Reply,
}

/// A sender that keeps every message in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentMessage>>,
    fail: AtomicBool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail after recording it.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Everything sent so far, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Bodies of the text replies sent so far.
    pub async fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|m| match &m.reply {
                Reply::Text(body) => Some(body.clone()),
                Reply::Media { .. } => None,
            })
            .collect()
    }

    /// Forget everything recorded.
    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }

    async fn record(&self, address: &str, reply: Reply) -> Result<(), OrchestratorError> {
        self.sent.lock().await.push(SentMessage {
            address: address.to_string(),
            reply,
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(OrchestratorError::SendFailed("recording sender set to fail".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, address: &str, body: &str) -> Result<(), OrchestratorError> {
        self.record(address, Reply::Text(body.to_string())).await
    }

    async fn send_media(
        &self,
        address: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        self.record(
            address,
            Reply::Media {
                url: url.to_string(),
                caption: caption.map(str::to_string),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sender() {
        let sender = NoOpSender;

        // Should not error
        sender.send_text("+1234567890", "test").await.unwrap();
        sender
            .send_media("+1234567890", "https://x/y.jpg", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_logging_sender() {
        let sender = LoggingSender;

        sender.send_text("+1234567890", "test").await.unwrap();
        sender
            .send_reply(
                "+1234567890",
                &Reply::Media {
                    url: "https://x/y.jpg".into(),
                    caption: Some("y.jpg".into()),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_recording_sender_keeps_order() {
        let sender = RecordingSender::new();
        sender.send_text("+1", "first").await.unwrap();
        sender.send_media("+1", "https://m", Some("cap")).await.unwrap();
        sender.send_text("+1", "third").await.unwrap();

        let sent = sender.sent().await;
        assert_eq!(sent.len(), 3);
        assert_eq!(
            sent[1].reply,
            Reply::Media {
                url: "https://m".into(),
                caption: Some("cap".into())
            }
        );
        assert_eq!(sender.texts().await, vec!["first", "third"]);
    }

    #[tokio::test]
    async fn test_recording_sender_failure_still_records() {
        let sender = RecordingSender::new();
        sender.set_failing(true);
        assert!(sender.send_text("+1", "lost").await.is_err());
        assert_eq!(sender.texts().await, vec!["lost"]);
    }

    #[tokio::test]
    async fn test_shared_sender_forwards() {
        let recorder = Arc::new(RecordingSender::new());
        let shared: Arc<dyn MessageSender> = recorder.clone();

        shared.send_reply("+1", &Reply::text("hello")).await.unwrap();
        assert_eq!(recorder.texts().await, vec!["hello".to_string()]);
    }
}
