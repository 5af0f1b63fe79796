//! In-process object store used by tests and local development.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::traits::{ListPage, ObjectStore};

/// Default number of keys returned per listing page.
const DEFAULT_PAGE_SIZE: usize = 1000;

/// An object held by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// BTreeMap-backed [`ObjectStore`].
///
/// Listing pages use the last key of the previous page as the continuation
/// token. Failures can be injected to exercise retry and isolation paths.
pub struct MemoryObjectStore {
    bucket: String,
    page_size: usize,
    objects: RwLock<BTreeMap<String, MemoryObject>>,
    fail_uploads: AtomicBool,
    /// Deletes allowed before failing; negative means unlimited.
    delete_budget: AtomicI64,
    upload_delay_ms: AtomicU64,
    upload_count: AtomicU64,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            page_size: DEFAULT_PAGE_SIZE,
            objects: RwLock::new(BTreeMap::new()),
            fail_uploads: AtomicBool::new(false),
            delete_budget: AtomicI64::new(-1),
            upload_delay_ms: AtomicU64::new(0),
            upload_count: AtomicU64::new(0),
        }
    }

    /// Set the listing page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every subsequent upload fail with [`StoreError::Unavailable`].
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Allow only `budget` more deletes before failing; `None` removes the limit.
    pub fn set_delete_budget(&self, budget: Option<u32>) {
        let value = budget.map(i64::from).unwrap_or(-1);
        self.delete_budget.store(value, Ordering::SeqCst);
    }

    /// Delay each upload by `delay`.
    pub fn set_upload_delay(&self, delay: Duration) {
        self.upload_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of successful uploads so far.
    pub fn upload_count(&self) -> u64 {
        self.upload_count.load(Ordering::SeqCst)
    }

    /// Fetch a stored object.
    pub async fn get(&self, key: &str) -> Option<MemoryObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Keys starting with `prefix`, sorted.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Follow a URL issued by [`ObjectStore::presigned_url`] back to its bytes.
    pub async fn resolve_url(&self, url: &str) -> Option<Vec<u8>> {
        let rest = url.strip_prefix("memory://")?;
        let rest = rest.strip_prefix(self.bucket.as_str())?.strip_prefix('/')?;
        let key = rest.split('?').next()?;
        self.get(key).await.map(|object| object.data)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, key: &str, data: &[u8], mime_type: &str) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("empty key".to_string()));
        }

        let delay = self.upload_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected upload failure".to_string()));
        }

        self.objects.write().await.insert(
            key.to_string(),
            MemoryObject {
                data: data.to_vec(),
                mime_type: mime_type.to_string(),
            },
        );
        self.upload_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn presigned_url(&self, key: &str, expiry: Duration) -> Result<String> {
        if !self.objects.read().await.contains_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(format!(
            "memory://{}/{}?expires={}",
            self.bucket,
            key,
            expiry.as_secs()
        ))
    }

    async fn list_page(&self, prefix: &str, continuation: Option<String>) -> Result<ListPage> {
        let objects = self.objects.read().await;
        let start = match continuation {
            Some(ref after) => Bound::Excluded(after.clone()),
            None => Bound::Included(prefix.to_string()),
        };

        let mut keys: Vec<String> = objects
            .range((start, Bound::Unbounded))
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .take(self.page_size + 1)
            .cloned()
            .collect();

        let continuation = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };

        Ok(ListPage { keys, continuation })
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let budget = self.delete_budget.load(Ordering::SeqCst);
        if budget == 0 {
            return Err(StoreError::Unavailable("injected delete failure".to_string()));
        }
        if budget > 0 {
            self.delete_budget.fetch_sub(1, Ordering::SeqCst);
        }

        self.objects.write().await.remove(key);
        Ok(())
    }
}
