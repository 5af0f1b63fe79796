//! S3-compatible object store (Backblaze B2 and friends).

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::traits::{ListPage, ObjectStore};

/// Region used when `B2_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-east-005";

/// Longest expiry S3 accepts for a presigned URL (7 days).
const MAX_PRESIGN_SECS: u64 = 7 * 24 * 60 * 60;

/// Connection settings for an S3-compatible bucket.
#[derive(Clone)]
pub struct S3Config {
    /// Endpoint URL (e.g., "https://s3.us-east-005.backblazeb2.com").
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key id.
    pub key_id: String,
    /// Secret key.
    pub application_key: String,
    /// Signing region.
    pub region: String,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("key_id", &self.key_id)
            .field("application_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl S3Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `B2_ENDPOINT` | Endpoint URL | (required) |
    /// | `B2_BUCKET_NAME` | Bucket name | (required) |
    /// | `B2_KEY_ID` | Access key id | (required) |
    /// | `B2_APPLICATION_KEY` | Secret key | (required) |
    /// | `B2_REGION` | Signing region | `us-east-005` |
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: required("B2_ENDPOINT")?,
            bucket: required("B2_BUCKET_NAME")?,
            key_id: required("B2_KEY_ID")?,
            application_key: required("B2_APPLICATION_KEY")?,
            region: env::var("B2_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StoreError::Config(format!("{name} environment variable is required")))
}

fn check_status(operation: &str, key: &str, status: u16) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StoreError::NotFound(key.to_string())),
        other => Err(StoreError::Unavailable(format!(
            "{operation} {key} returned HTTP {other}"
        ))),
    }
}

/// [`ObjectStore`] backed by an S3-compatible bucket, addressed path-style.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
}

impl S3ObjectStore {
    /// Build a store from configuration. No network calls are made.
    pub fn new(config: &S3Config) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.key_id),
            Some(&config.application_key),
            None,
            None,
            None,
        )
        .map_err(|e| StoreError::Config(format!("invalid credentials: {e}")))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StoreError::Config(format!("invalid bucket: {e}")))?
            .with_path_style();

        Ok(Self { bucket })
    }

    /// Name of the underlying bucket.
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, key: &str, data: &[u8], mime_type: &str) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("empty key".to_string()));
        }

        let response = self
            .bucket
            .put_object_with_content_type(key, data, mime_type)
            .await?;
        check_status("PUT", key, response.status_code())?;

        debug!(key, bytes = data.len(), "Object uploaded");
        Ok(())
    }

    async fn presigned_url(&self, key: &str, expiry: Duration) -> Result<String> {
        let secs = expiry.as_secs().clamp(1, MAX_PRESIGN_SECS) as u32;
        let url = self.bucket.presign_get(key, secs, None).await?;
        Ok(url)
    }

    async fn list_page(&self, prefix: &str, continuation: Option<String>) -> Result<ListPage> {
        let (result, status) = self
            .bucket
            .list_page(prefix.to_string(), None, continuation, None, None)
            .await?;
        check_status("LIST", prefix, status)?;

        let keys = result.contents.into_iter().map(|object| object.key).collect();
        let continuation = if result.is_truncated {
            result.next_continuation_token
        } else {
            None
        };

        Ok(ListPage { keys, continuation })
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let response = self.bucket.delete_object(key).await?;
        match check_status("DELETE", key, response.status_code()) {
            Err(StoreError::NotFound(_)) => {
                warn!(key, "Object already gone");
                Ok(())
            }
            other => other,
        }
    }
}
