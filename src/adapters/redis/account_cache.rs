//! Redis-backed account cache.
//!
//! Read-through cache keyed by external identity with a fixed short expiry
//! (SETEX). Never authoritative: every error path degrades to a miss and is
//! logged, and writers invalidate synchronously with their store writes.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::account::Account;
use crate::domain::foundation::ExternalIdentityId;
use crate::ports::AccountCache;

const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Redis implementation of the account cache.
#[derive(Clone)]
pub struct RedisAccountCache {
    conn: MultiplexedConnection,
    ttl: Duration,
}

impl RedisAccountCache {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_ttl(conn, DEFAULT_TTL)
    }

    pub fn with_ttl(conn: MultiplexedConnection, ttl: Duration) -> Self {
        Self { conn, ttl }
    }

    fn key(external_id: &ExternalIdentityId) -> String {
        format!("account:by-identity:{}", external_id)
    }
}

#[async_trait]
impl AccountCache for RedisAccountCache {
    async fn get(&self, external_id: &ExternalIdentityId) -> Option<Account> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = match conn.get(Self::key(external_id)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "account cache read failed");
                return None;
            }
        };

        raw.and_then(|json| match serde_json::from_str(&json) {
            Ok(account) => Some(account),
            Err(e) => {
                tracing::warn!(error = %e, "account cache entry unreadable; dropping");
                None
            }
        })
    }

    async fn put(&self, account: &Account) {
        let json = match serde_json::to_string(account) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "account cache serialize failed");
                return;
            }
        };

        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::key(&account.external_id), json, self.ttl.as_secs())
            .await
        {
            tracing::warn!(error = %e, "account cache write failed");
        }
    }

    async fn invalidate(&self, external_id: &ExternalIdentityId) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<_, ()>(Self::key(external_id)).await {
            tracing::warn!(error = %e, "account cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_includes_identity() {
        let id = ExternalIdentityId::new("idp|abc").unwrap();
        assert_eq!(RedisAccountCache::key(&id), "account:by-identity:idp|abc");
    }
}
