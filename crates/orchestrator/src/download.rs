//! Media download seam.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::OrchestratorError;

/// Fetches the bytes behind an attachment locator.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, locator: &str) -> Result<Vec<u8>, OrchestratorError>;
}

/// Serves bytes from an in-memory map. Unknown locators fail.
#[derive(Debug, Default)]
pub struct StaticDownloader {
    media: RwLock<HashMap<String, Vec<u8>>>,
}

impl StaticDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes for a locator.
    pub async fn insert(&self, locator: impl Into<String>, bytes: Vec<u8>) {
        self.media.write().await.insert(locator.into(), bytes);
    }
}

#[async_trait]
impl MediaDownloader for StaticDownloader {
    async fn download(&self, locator: &str) -> Result<Vec<u8>, OrchestratorError> {
        self.media
            .read()
            .await
            .get(locator)
            .cloned()
            .ok_or_else(|| OrchestratorError::Download(format!("no media at {locator}")))
    }
}
