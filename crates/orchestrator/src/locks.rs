//! Per-account serialization.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Registry of one async mutex per account.
///
/// Holders serialize the read-decide-write steps of a single account. Network
/// transfers must not run while a guard is held.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `account_id`.
    pub async fn lock(&self, account_id: &str) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(account_id).cloned();
        let mutex = match existing {
            Some(mutex) => mutex,
            None => self
                .locks
                .write()
                .await
                .entry(account_id.to_string())
                .or_default()
                .clone(),
        };
        mutex.lock_owned().await
    }

    /// Forget the lock of a deleted account.
    pub async fn remove(&self, account_id: &str) {
        self.locks.write().await.remove(account_id);
    }

    /// Number of registered accounts.
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}
