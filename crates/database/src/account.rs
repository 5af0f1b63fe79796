//! Account CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Account;

const ACCOUNT_COLUMNS: &str = "id, address, onboarded, storage_used_bytes, storage_limit_bytes, \
     awaiting_delete_confirmation, created_at, updated_at";

/// Create a new account with zero usage and the given limit.
pub async fn create_account(
    pool: &SqlitePool,
    id: &str,
    address: &str,
    storage_limit_bytes: i64,
) -> Result<Account> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, address, storage_limit_bytes)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(address)
    .bind(storage_limit_bytes)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Account",
                    id: address.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_account(pool, id).await
}

/// Get an account by ID.
pub async fn get_account(pool: &SqlitePool, id: &str) -> Result<Account> {
    find_account(pool, id).await?.ok_or_else(|| DatabaseError::NotFound {
        entity: "Account",
        id: id.to_string(),
    })
}

/// Get an account by ID, if it exists.
pub async fn find_account(pool: &SqlitePool, id: &str) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?");
    let account = sqlx::query_as::<_, Account>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(account)
}

/// Get an account by its sender address, if it exists.
pub async fn find_by_address(pool: &SqlitePool, address: &str) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE address = ?");
    let account = sqlx::query_as::<_, Account>(&query)
        .bind(address)
        .fetch_optional(pool)
        .await?;

    Ok(account)
}

/// Mark an account as onboarded.
///
/// Returns `true` if this call flipped the flag, `false` if it was already set.
pub async fn mark_onboarded(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET onboarded = 1,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND onboarded = 0
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        // Distinguish "already onboarded" from "no such account".
        get_account(pool, id).await?;
        return Ok(false);
    }

    Ok(true)
}

/// Set or clear the delete-confirmation flag.
pub async fn set_awaiting_delete_confirmation(
    pool: &SqlitePool,
    id: &str,
    awaiting: bool,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET awaiting_delete_confirmation = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(awaiting)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete an account together with every file record it owns.
///
/// Returns the number of file records removed.
pub async fn delete_account(pool: &SqlitePool, id: &str) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let files = sqlx::query(
        r#"
        DELETE FROM stored_files
        WHERE account_id = ?
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query(
        r#"
        DELETE FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: id.to_string(),
        });
    }

    tx.commit().await?;

    tracing::info!(account_id = %id, files = files.rows_affected(), "Deleted account");
    Ok(files.rows_affected())
}

/// Count total accounts.
pub async fn count_accounts(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM accounts
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
