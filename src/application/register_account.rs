//! Account resolution from verified identities.
//!
//! Accounts are created lazily: the first time a verified identity shows
//! up, a trial account is registered for it. Subsequent lookups go through
//! the read-through cache; the underlying store stays authoritative.

use std::sync::Arc;

use crate::domain::account::Account;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{AccountCache, AccountRepository, IdentityProvider, VerifiedIdentity};

/// Resolves bearer tokens into accounts, creating them on first use.
pub struct RegisterAccountHandler {
    identity: Arc<dyn IdentityProvider>,
    accounts: Arc<dyn AccountRepository>,
    cache: Arc<dyn AccountCache>,
    trial_days: i64,
}

impl RegisterAccountHandler {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        accounts: Arc<dyn AccountRepository>,
        cache: Arc<dyn AccountCache>,
        trial_days: i64,
    ) -> Self {
        Self {
            identity,
            accounts,
            cache,
            trial_days,
        }
    }

    /// Verifies a bearer token and returns the owning account, creating it
    /// if this identity has never been seen.
    pub async fn authenticate(&self, bearer: &str) -> Result<Account, DomainError> {
        let identity = self
            .identity
            .verify_bearer(bearer)
            .await
            .map_err(|e| DomainError::new(ErrorCode::Unauthorized, e.to_string()))?;

        self.resolve(identity).await
    }

    /// Looks up or lazily creates the account for a verified identity.
    pub async fn resolve(&self, identity: VerifiedIdentity) -> Result<Account, DomainError> {
        if let Some(account) = self.cache.get(&identity.external_id).await {
            return Ok(account);
        }

        if let Some(account) = self.accounts.find_by_external_id(&identity.external_id).await? {
            self.cache.put(&account).await;
            return Ok(account);
        }

        let account = Account::register(
            identity.external_id.clone(),
            identity.email,
            identity.display_name,
            self.trial_days,
        );

        match self.accounts.create(&account).await {
            Ok(()) => {
                tracing::info!(
                    account_id = %account.id,
                    external_id = %account.external_id,
                    "account registered"
                );
                self.cache.put(&account).await;
                Ok(account)
            }
            // Two first requests can race on creation; the loser reads the
            // winner's row.
            Err(e) if e.code == ErrorCode::Conflict => self
                .accounts
                .find_by_external_id(&identity.external_id)
                .await?
                .ok_or(e),
            Err(e) => Err(e),
        }
    }
}
