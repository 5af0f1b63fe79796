use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys in this page, in store order.
    pub keys: Vec<String>,
    /// Token for the next page; `None` when the listing is complete.
    pub continuation: Option<String>,
}

/// Key-addressed object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, overwriting any previous object.
    async fn upload(&self, key: &str, data: &[u8], mime_type: &str) -> Result<()>;

    /// Issue a time-limited GET URL for `key`.
    ///
    /// Implementations may issue the URL without checking that the key exists.
    async fn presigned_url(&self, key: &str, expiry: Duration) -> Result<String>;

    /// List one page of keys starting with `prefix`.
    async fn list_page(&self, prefix: &str, continuation: Option<String>) -> Result<ListPage>;

    /// Delete a single object. Deleting a missing key succeeds.
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Delete every object whose key starts with `prefix`.
    ///
    /// Pages are deleted one at a time until the listing reports no more
    /// results. Running it again after an interruption picks up whatever is
    /// left, so repeated calls converge on an empty prefix.
    ///
    /// Returns the number of objects deleted by this call.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        if prefix.is_empty() {
            return Err(StoreError::InvalidKey(
                "refusing to delete with an empty prefix".to_string(),
            ));
        }

        let mut deleted = 0u64;
        let mut continuation = None;

        loop {
            let page = self.list_page(prefix, continuation.take()).await?;
            debug!(prefix, keys = page.keys.len(), "Deleting listing page");

            for key in &page.keys {
                self.delete_object(key).await?;
                deleted += 1;
            }

            match page.continuation {
                Some(token) if !page.keys.is_empty() => continuation = Some(token),
                _ => break,
            }
        }

        info!(prefix, deleted, "Prefix deleted");
        Ok(deleted)
    }
}
