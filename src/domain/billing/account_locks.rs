//! Per-account async locks.
//!
//! Payment events for the same account may arrive concurrently; the
//! processor serializes its read-modify-write cycle per account id so
//! overlapping events apply in arrival order instead of racing. Locks for
//! different accounts do not contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::AccountId;

/// Keyed lock map over account ids.
///
/// Entries persist for the process lifetime; the map only grows with the
/// set of accounts that have received payment events since startup.
#[derive(Clone, Default)]
pub struct AccountLocks {
    inner: Arc<Mutex<HashMap<AccountId, Arc<Mutex<()>>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one account, waiting if another task holds it.
    pub async fn acquire(&self, id: AccountId) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().await;
            map.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        entry.lock_owned().await
    }
}
