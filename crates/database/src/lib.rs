//! SQLite persistence layer for WADrive.
//!
//! This crate provides async database operations for accounts and the
//! metadata of their backed-up files using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{account, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:wadrive.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create an account with a 500 MB quota
//!     let account = account::create_account(
//!         db.pool(),
//!         "c27fb365-0c84-4cf2-8555-814bb065e448",
//!         "+2348012345678",
//!         524_288_000,
//!     )
//!     .await?;
//!     println!("{} has {} bytes left", account.address, account.remaining_bytes());
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod error;
pub mod models;
pub mod stored_file;

pub use error::{DatabaseError, Result};
pub use models::{Account, MediaCategory, NewStoredFile, StoredFile};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent webhook deliveries.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/wadrive.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing). Every connection opens its own
    /// // empty database, so keep the pool to one.
    /// let db = database::Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn new_file(id: &str, account_id: &str, category: MediaCategory, size: i64) -> NewStoredFile {
        NewStoredFile {
            id: id.to_string(),
            account_id: account_id.to_string(),
            category,
            mime_type: "image/jpeg".to_string(),
            size_bytes: size,
            original_name: format!("{id}.jpg"),
            storage_key: format!("accounts/{account_id}/{category}/{id}.jpg"),
            content_checksum: "00".repeat(32),
        }
    }

    #[tokio::test]
    async fn test_memory_database_keeps_schema_across_queries() {
        let db = test_db().await;
        for i in 0..3 {
            account::create_account(db.pool(), &format!("acc-{i}"), &format!("+1555000{i}"), 10)
                .await
                .unwrap();
        }
        assert_eq!(account::count_accounts(db.pool()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_account_crud() {
        let db = test_db().await;

        // Create
        let created = account::create_account(db.pool(), "acc-1", "+15550001", 1000)
            .await
            .unwrap();
        assert_eq!(created.address, "+15550001");
        assert_eq!(created.storage_used_bytes, 0);
        assert_eq!(created.storage_limit_bytes, 1000);
        assert!(!created.onboarded);
        assert!(!created.awaiting_delete_confirmation);

        // Duplicate address
        let dup = account::create_account(db.pool(), "acc-2", "+15550001", 1000).await;
        assert!(matches!(dup, Err(DatabaseError::AlreadyExists { .. })));

        // Lookup
        let found = account::find_by_address(db.pool(), "+15550001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "acc-1");
        assert!(account::find_by_address(db.pool(), "+15559999")
            .await
            .unwrap()
            .is_none());

        // Flags
        assert!(account::mark_onboarded(db.pool(), "acc-1").await.unwrap());
        assert!(!account::mark_onboarded(db.pool(), "acc-1").await.unwrap());
        account::set_awaiting_delete_confirmation(db.pool(), "acc-1", true)
            .await
            .unwrap();
        let fetched = account::get_account(db.pool(), "acc-1").await.unwrap();
        assert!(fetched.onboarded);
        assert!(fetched.awaiting_delete_confirmation);

        assert_eq!(account::count_accounts(db.pool()).await.unwrap(), 1);

        // Delete
        account::delete_account(db.pool(), "acc-1").await.unwrap();
        let result = account::get_account(db.pool(), "acc-1").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_record_upload_charges_usage() {
        let db = test_db().await;
        account::create_account(db.pool(), "acc-1", "+15550001", 1000)
            .await
            .unwrap();

        let (file, account) = stored_file::record_upload(
            db.pool(),
            &new_file("f-1", "acc-1", MediaCategory::Image, 400),
        )
        .await
        .unwrap();
        assert_eq!(file.size_bytes, 400);
        assert_eq!(account.storage_used_bytes, 400);

        let (_, account) = stored_file::record_upload(
            db.pool(),
            &new_file("f-2", "acc-1", MediaCategory::Document, 600),
        )
        .await
        .unwrap();
        assert_eq!(account.storage_used_bytes, 1000);
        assert_eq!(
            stored_file::total_size_for_account(db.pool(), "acc-1")
                .await
                .unwrap(),
            1000
        );
    }

    #[tokio::test]
    async fn test_record_upload_rejects_over_quota() {
        let db = test_db().await;
        account::create_account(db.pool(), "acc-1", "+15550001", 1000)
            .await
            .unwrap();
        stored_file::record_upload(
            db.pool(),
            &new_file("f-1", "acc-1", MediaCategory::Image, 900),
        )
        .await
        .unwrap();

        let result = stored_file::record_upload(
            db.pool(),
            &new_file("f-2", "acc-1", MediaCategory::Image, 101),
        )
        .await;
        match result {
            Err(DatabaseError::QuotaExceeded {
                used,
                requested,
                limit,
                ..
            }) => {
                assert_eq!(used, 900);
                assert_eq!(requested, 101);
                assert_eq!(limit, 1000);
            }
            other => panic!("expected QuotaExceeded, got {:?}", other),
        }

        // Nothing was written for the rejected file.
        assert_eq!(
            stored_file::count_for_account(db.pool(), "acc-1")
                .await
                .unwrap(),
            1
        );
        let account = account::get_account(db.pool(), "acc-1").await.unwrap();
        assert_eq!(account.storage_used_bytes, 900);
    }

    #[tokio::test]
    async fn test_record_upload_unknown_account() {
        let db = test_db().await;
        let result = stored_file::record_upload(
            db.pool(),
            &new_file("f-1", "missing", MediaCategory::Image, 1),
        )
        .await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_recent_filters_and_orders() {
        let db = test_db().await;
        account::create_account(db.pool(), "acc-1", "+15550001", 10_000)
            .await
            .unwrap();
        account::create_account(db.pool(), "acc-2", "+15550002", 10_000)
            .await
            .unwrap();

        for (i, category) in [
            MediaCategory::Image,
            MediaCategory::Video,
            MediaCategory::Image,
            MediaCategory::Audio,
        ]
        .into_iter()
        .enumerate()
        {
            stored_file::record_upload(
                db.pool(),
                &new_file(&format!("f-{i}"), "acc-1", category, 10),
            )
            .await
            .unwrap();
        }
        stored_file::record_upload(
            db.pool(),
            &new_file("other", "acc-2", MediaCategory::Image, 10),
        )
        .await
        .unwrap();

        let images = stored_file::list_recent(db.pool(), "acc-1", Some(MediaCategory::Image), 10)
            .await
            .unwrap();
        let ids: Vec<_> = images.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f-2", "f-0"]);

        let recent = stored_file::list_recent(db.pool(), "acc-1", None, 3)
            .await
            .unwrap();
        let ids: Vec<_> = recent.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f-3", "f-2", "f-1"]);
    }

    #[tokio::test]
    async fn test_delete_account_cascades_files() {
        let db = test_db().await;
        account::create_account(db.pool(), "acc-1", "+15550001", 1000)
            .await
            .unwrap();
        stored_file::record_upload(
            db.pool(),
            &new_file("f-1", "acc-1", MediaCategory::Image, 10),
        )
        .await
        .unwrap();
        stored_file::record_upload(
            db.pool(),
            &new_file("f-2", "acc-1", MediaCategory::Video, 10),
        )
        .await
        .unwrap();

        let removed = account::delete_account(db.pool(), "acc-1").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(
            stored_file::count_for_account(db.pool(), "acc-1")
                .await
                .unwrap(),
            0
        );
        assert!(matches!(
            stored_file::get_file(db.pool(), "f-1").await,
            Err(DatabaseError::NotFound { .. })
        ));

        // The address is free again.
        account::create_account(db.pool(), "acc-3", "+15550001", 1000)
            .await
            .unwrap();
    }

    #[test]
    fn test_media_category_round_trip() {
        for category in MediaCategory::ALL {
            assert_eq!(category.as_str().parse::<MediaCategory>().unwrap(), category);
        }
        assert!("sticker".parse::<MediaCategory>().is_err());
    }
}
