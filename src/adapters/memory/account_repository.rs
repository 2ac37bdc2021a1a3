//! In-memory AccountRepository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::account::{Account, ReminderTime, SubscriptionStatus};
use crate::domain::foundation::{
    AccountId, CustomerRef, DomainError, ErrorCode, ExternalIdentityId, Timestamp,
};
use crate::ports::AccountRepository;

/// HashMap-backed account store.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().await;
        if accounts
            .values()
            .any(|a| a.external_id == account.external_id)
        {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("account for identity {} already exists", account.external_id),
            ));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().await;
        if !accounts.contains_key(&account.id) {
            return Err(DomainError::new(
                ErrorCode::AccountNotFound,
                format!("account {} not found", account.id),
            ));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalIdentityId,
    ) -> Result<Option<Account>, DomainError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| &a.external_id == external_id)
            .cloned())
    }

    async fn find_by_customer_ref(
        &self,
        customer_ref: &CustomerRef,
    ) -> Result<Option<Account>, DomainError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.subscription.customer_ref.as_ref() == Some(customer_ref))
            .cloned())
    }

    async fn find_reminder_candidates(
        &self,
        time: ReminderTime,
    ) -> Result<Vec<Account>, DomainError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| {
                a.is_active
                    && a.wants_reminder_at(time)
                    && !a.notifications.device_tokens.is_empty()
            })
            .cloned()
            .collect())
    }

    async fn find_trials_ending_between(
        &self,
        now: Timestamp,
        cutoff: Timestamp,
    ) -> Result<Vec<Account>, DomainError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| {
                a.is_active
                    && a.subscription.status == SubscriptionStatus::Trial
                    && a.subscription.trial_ends_at >= now
                    && a.subscription.trial_ends_at <= cutoff
            })
            .cloned()
            .collect())
    }
}
