//! Read-through account cache port.
//!
//! A short-lived cache keyed by external identity. It is an optimization
//! only and is never authoritative for entitlement decisions; every
//! entitlement mutation must invalidate or refresh the entry synchronously
//! with the underlying write.
//!
//! The interface is infallible: a broken cache degrades to a miss, logged by
//! the adapter.

use async_trait::async_trait;

use crate::domain::account::Account;
use crate::domain::foundation::ExternalIdentityId;

/// Port for the account read-through cache.
#[async_trait]
pub trait AccountCache: Send + Sync {
    /// Returns the cached account, or `None` on miss/expiry/error.
    async fn get(&self, external_id: &ExternalIdentityId) -> Option<Account>;

    /// Stores the account under its external identity with the fixed TTL.
    async fn put(&self, account: &Account);

    /// Removes the entry for this identity.
    async fn invalidate(&self, external_id: &ExternalIdentityId);
}
