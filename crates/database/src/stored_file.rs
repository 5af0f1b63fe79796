//! Stored file records and usage accounting.

use sqlx::SqlitePool;

use crate::account::find_account;
use crate::error::{DatabaseError, Result};
use crate::models::{Account, MediaCategory, NewStoredFile, StoredFile};

const FILE_COLUMNS: &str = "id, account_id, category, mime_type, size_bytes, original_name, \
     storage_key, content_checksum, created_at";

/// Record an uploaded object and charge its size to the owning account.
///
/// The usage increment and the insert run in one transaction. The increment is
/// conditional on the account staying within its limit, so concurrent writers
/// can never push `storage_used_bytes` past `storage_limit_bytes`; the loser
/// gets [`DatabaseError::QuotaExceeded`] and nothing is written.
///
/// Returns the inserted record and the account as it is after the commit.
pub async fn record_upload(
    pool: &SqlitePool,
    file: &NewStoredFile,
) -> Result<(StoredFile, Account)> {
    let mut tx = pool.begin().await?;

    let charged = sqlx::query(
        r#"
        UPDATE accounts
        SET storage_used_bytes = storage_used_bytes + ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND storage_used_bytes + ? <= storage_limit_bytes
        "#,
    )
    .bind(file.size_bytes)
    .bind(&file.account_id)
    .bind(file.size_bytes)
    .execute(&mut *tx)
    .await?;

    if charged.rows_affected() == 0 {
        tx.rollback().await?;
        let account = find_account(pool, &file.account_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "Account",
                id: file.account_id.clone(),
            })?;
        return Err(DatabaseError::QuotaExceeded {
            account_id: account.id,
            used: account.storage_used_bytes,
            requested: file.size_bytes,
            limit: account.storage_limit_bytes,
        });
    }

    sqlx::query(
        r#"
        INSERT INTO stored_files
            (id, account_id, category, mime_type, size_bytes, original_name, storage_key, content_checksum)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&file.id)
    .bind(&file.account_id)
    .bind(file.category)
    .bind(&file.mime_type)
    .bind(file.size_bytes)
    .bind(&file.original_name)
    .bind(&file.storage_key)
    .bind(&file.content_checksum)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "StoredFile",
                    id: file.storage_key.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    let file_query = format!("SELECT {FILE_COLUMNS} FROM stored_files WHERE id = ?");
    let stored = sqlx::query_as::<_, StoredFile>(&file_query)
        .bind(&file.id)
        .fetch_one(&mut *tx)
        .await?;

    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, address, onboarded, storage_used_bytes, storage_limit_bytes,
               awaiting_delete_confirmation, created_at, updated_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(&file.account_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(
        account_id = %account.id,
        file_id = %stored.id,
        size = stored.size_bytes,
        used = account.storage_used_bytes,
        "Recorded upload"
    );

    Ok((stored, account))
}

/// Get a stored file by ID.
pub async fn get_file(pool: &SqlitePool, id: &str) -> Result<StoredFile> {
    let query = format!("SELECT {FILE_COLUMNS} FROM stored_files WHERE id = ?");
    sqlx::query_as::<_, StoredFile>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "StoredFile",
            id: id.to_string(),
        })
}

/// List the most recent files of an account, newest first.
///
/// When `category` is `None` all categories are included.
pub async fn list_recent(
    pool: &SqlitePool,
    account_id: &str,
    category: Option<MediaCategory>,
    limit: i64,
) -> Result<Vec<StoredFile>> {
    let rows = match category {
        Some(category) => {
            let query = format!(
                "SELECT {FILE_COLUMNS} FROM stored_files \
                 WHERE account_id = ? AND category = ? \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?"
            );
            sqlx::query_as::<_, StoredFile>(&query)
                .bind(account_id)
                .bind(category)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        None => {
            let query = format!(
                "SELECT {FILE_COLUMNS} FROM stored_files \
                 WHERE account_id = ? \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?"
            );
            sqlx::query_as::<_, StoredFile>(&query)
                .bind(account_id)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

/// Count the files owned by an account.
pub async fn count_for_account(pool: &SqlitePool, account_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM stored_files WHERE account_id = ?
        "#,
    )
    .bind(account_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Sum of the sizes of all files owned by an account.
///
/// Should always equal the account's `storage_used_bytes`.
pub async fn total_size_for_account(pool: &SqlitePool, account_id: &str) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(size_bytes), 0) FROM stored_files WHERE account_id = ?
        "#,
    )
    .bind(account_id)
    .fetch_one(pool)
    .await?;

    Ok(total)
}
