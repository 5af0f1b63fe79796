//! Object store gateway for backed-up media.
//!
//! The [`ObjectStore`] trait covers the four operations the backup pipeline
//! needs: upload, presigned retrieval, paginated listing and deletion by
//! prefix. [`S3ObjectStore`] talks to any S3-compatible bucket; the
//! [`MemoryObjectStore`] keeps everything in process for tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use blob_store::{MemoryObjectStore, ObjectStore};
//!
//! # async fn example() -> blob_store::Result<()> {
//! let store = MemoryObjectStore::default();
//! store.upload("accounts/a/image/1.jpg", b"...", "image/jpeg").await?;
//! let url = store
//!     .presigned_url("accounts/a/image/1.jpg", Duration::from_secs(3600))
//!     .await?;
//! println!("{url}");
//! store.delete_prefix("accounts/a/").await?;
//! # Ok(())
//! # }
//! ```

mod checksum;
mod error;
mod memory;
mod s3_store;
mod traits;

pub use checksum::ContentChecksum;
pub use error::{Result, StoreError};
pub use memory::{MemoryObject, MemoryObjectStore};
pub use s3_store::{S3Config, S3ObjectStore, DEFAULT_REGION};
pub use traits::{ListPage, ObjectStore};
