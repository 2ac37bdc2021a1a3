//! Account repository port.
//!
//! Persistence contract for the entitlement store. Implementations must
//! guarantee the uniqueness of `external_id` and `customer_ref` mappings and
//! apply updates atomically per account row; last-writer-wins on the
//! subscription sub-record is acceptable only because callers serialize
//! writers per account id.

use async_trait::async_trait;

use crate::domain::account::{Account, ReminderTime};
use crate::domain::foundation::{AccountId, CustomerRef, DomainError, ExternalIdentityId, Timestamp};

/// Repository port for Account aggregate persistence.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persists a new account.
    ///
    /// # Errors
    ///
    /// - `Conflict` if an account with the same external id exists
    /// - `DatabaseError` on persistence failure
    async fn create(&self, account: &Account) -> Result<(), DomainError>;

    /// Updates an existing account.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account does not exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, account: &Account) -> Result<(), DomainError>;

    /// Finds an account by internal id.
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    /// Finds an account by external identity-provider id.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalIdentityId,
    ) -> Result<Option<Account>, DomainError>;

    /// Finds the account owning a payment provider customer reference.
    ///
    /// Returns `None` when the reference has no mapped account; callers
    /// treat that as an anomaly, not an error.
    async fn find_by_customer_ref(
        &self,
        customer_ref: &CustomerRef,
    ) -> Result<Option<Account>, DomainError>;

    /// Accounts eligible for a progress reminder at the given time: active
    /// (not soft-deactivated), notifications enabled, the time present in
    /// their preference set, and at least one device token.
    async fn find_reminder_candidates(
        &self,
        time: ReminderTime,
    ) -> Result<Vec<Account>, DomainError>;

    /// Trial accounts whose `trial_ends_at` falls within `[now, cutoff]`.
    async fn find_trials_ending_between(
        &self,
        now: Timestamp,
        cutoff: Timestamp,
    ) -> Result<Vec<Account>, DomainError>;
}
