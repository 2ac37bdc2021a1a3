//! In-memory AccountCache implementation.
//!
//! Honors the fixed TTL so tests exercise expiry the same way the Redis
//! adapter does.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::domain::account::Account;
use crate::domain::foundation::ExternalIdentityId;
use crate::ports::AccountCache;

const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// HashMap-backed account cache with entry expiry.
pub struct InMemoryAccountCache {
    entries: Mutex<HashMap<ExternalIdentityId, (Account, Instant)>>,
    ttl: Duration,
}

impl InMemoryAccountCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for InMemoryAccountCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountCache for InMemoryAccountCache {
    async fn get(&self, external_id: &ExternalIdentityId) -> Option<Account> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(external_id) {
            Some((account, stored_at)) if stored_at.elapsed() < self.ttl => {
                Some(account.clone())
            }
            Some(_) => {
                entries.remove(external_id);
                None
            }
            None => None,
        }
    }

    async fn put(&self, account: &Account) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(account.external_id.clone(), (account.clone(), Instant::now()));
    }

    async fn invalidate(&self, external_id: &ExternalIdentityId) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .remove(external_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(tag: &str) -> Account {
        Account::register(
            ExternalIdentityId::new(format!("idp|{}", tag)).unwrap(),
            format!("{}@example.com", tag),
            None,
            14,
        )
    }

    #[tokio::test]
    async fn put_then_get_returns_account() {
        let cache = InMemoryAccountCache::new();
        let a = account("amy");
        cache.put(&a).await;

        let hit = cache.get(&a.external_id).await;
        assert_eq!(hit.map(|a| a.id), Some(a.id));
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = InMemoryAccountCache::new();
        let a = account("amy");
        cache.put(&a).await;
        cache.invalidate(&a.external_id).await;

        assert!(cache.get(&a.external_id).await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_read_as_miss() {
        let cache = InMemoryAccountCache::with_ttl(Duration::ZERO);
        let a = account("amy");
        cache.put(&a).await;

        assert!(cache.get(&a.external_id).await.is_none());
    }
}
