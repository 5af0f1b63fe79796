//! Sender address to account resolution.

use database::{account, Account, Database, DatabaseError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::OrchestratorError;

/// Channel prefix some providers put in front of the phone number.
const CHANNEL_PREFIX: &str = "whatsapp:";

/// Strip whitespace and the channel prefix from a sender address.
pub fn normalize_address(address: &str) -> &str {
    let trimmed = address.trim();
    trimmed.strip_prefix(CHANNEL_PREFIX).unwrap_or(trimmed).trim()
}

/// Maps sender addresses to accounts, creating them on first contact.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    database: Database,
    free_tier_bytes: i64,
}

impl IdentityResolver {
    pub fn new(database: Database, free_tier_bytes: i64) -> Self {
        Self {
            database,
            free_tier_bytes,
        }
    }

    /// Find or create the account for `address`.
    ///
    /// Returns the account and whether this call created it. When two first
    /// contacts race, the loser re-reads the winner's row and reports
    /// `false`.
    pub async fn resolve(&self, address: &str) -> Result<(Account, bool), OrchestratorError> {
        let address = normalize_address(address);
        if address.is_empty() {
            return Err(OrchestratorError::InvalidEvent("empty sender address".into()));
        }

        if let Some(existing) = account::find_by_address(self.database.pool(), address).await? {
            debug!(account_id = %existing.id, "Resolved existing account");
            return Ok((existing, false));
        }

        let id = Uuid::new_v4().to_string();
        match account::create_account(self.database.pool(), &id, address, self.free_tier_bytes).await {
            Ok(created) => {
                info!(account_id = %created.id, "Created account");
                Ok((created, true))
            }
            Err(DatabaseError::AlreadyExists { .. }) => {
                let winner = account::find_by_address(self.database.pool(), address)
                    .await?
                    .ok_or_else(|| DatabaseError::NotFound {
                        entity: "Account",
                        id: address.to_string(),
                    })?;
                debug!(account_id = %winner.id, "Lost account creation race");
                Ok((winner, false))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_database;

    #[test]
    fn normalizes_channel_prefix() {
        assert_eq!(normalize_address("whatsapp:+2348012345678"), "+2348012345678");
        assert_eq!(normalize_address("  +2348012345678\n"), "+2348012345678");
    }

    #[tokio::test]
    async fn creates_once_then_resolves() {
        let db = memory_database().await;
        let resolver = IdentityResolver::new(db.clone(), 1_000);

        let (first, is_new) = resolver.resolve("whatsapp:+15550001").await.unwrap();
        assert!(is_new);
        assert_eq!(first.address, "+15550001");
        assert_eq!(first.storage_limit_bytes, 1_000);
        assert!(!first.onboarded);

        let (second, is_new) = resolver.resolve("+15550001").await.unwrap();
        assert!(!is_new);
        assert_eq!(second.id, first.id);
        assert_eq!(account::count_accounts(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_contact_creates_one_account() {
        let db = memory_database().await;
        let resolver = IdentityResolver::new(db.clone(), 1_000);

        let (a, b) = tokio::join!(resolver.resolve("+15550002"), resolver.resolve("+15550002"));
        let (a, a_new) = a.unwrap();
        let (b, b_new) = b.unwrap();
        assert_eq!(a.id, b.id);
        assert!(a_new ^ b_new);
        assert_eq!(account::count_accounts(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_empty_address() {
        let resolver = IdentityResolver::new(memory_database().await, 1_000);
        let result = resolver.resolve("whatsapp:").await;
        assert!(matches!(result, Err(OrchestratorError::InvalidEvent(_))));
    }
}
