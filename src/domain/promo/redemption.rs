//! Redemption coordinator.
//!
//! Drives the `unredeemed -> redeemed` transition for one promo code and one
//! account. The transition is one-way and exactly-once per account.
//!
//! Validation is re-run at redemption time, but the authoritative decision
//! is the ledger's single atomic conditional update: increment and append
//! happen only while every predicate still holds, so two racing redemptions
//! can never both consume the last use or double-register one account.

use std::sync::Arc;

use crate::domain::account::Account;
use crate::domain::billing::AccountLocks;
use crate::domain::foundation::{AccountId, DomainError, ErrorCode, Timestamp};
use crate::ports::{
    AccountCache, AccountRepository, AuditLog, AuditOutcome, AuditRecord, PromoCodeRepository,
    RedeemOutcome,
};

use super::entry::{PromoCodeEntry, PromoCodeKind};
use super::errors::{RedemptionDenied, RedemptionError};
use super::PromoCode;

/// Result of a validation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub reason: Option<RedemptionDenied>,
}

impl ValidationReport {
    fn valid() -> Self {
        Self { valid: true, reason: None }
    }

    fn invalid(reason: RedemptionDenied) -> Self {
        Self { valid: false, reason: Some(reason) }
    }
}

/// Applies promo codes to accounts with exactly-once-per-account semantics.
pub struct RedemptionCoordinator {
    ledger: Arc<dyn PromoCodeRepository>,
    accounts: Arc<dyn AccountRepository>,
    cache: Arc<dyn AccountCache>,
    audit: Arc<dyn AuditLog>,
    locks: AccountLocks,
}

impl RedemptionCoordinator {
    pub fn new(
        ledger: Arc<dyn PromoCodeRepository>,
        accounts: Arc<dyn AccountRepository>,
        cache: Arc<dyn AccountCache>,
        audit: Arc<dyn AuditLog>,
        locks: AccountLocks,
    ) -> Self {
        Self {
            ledger,
            accounts,
            cache,
            audit,
            locks,
        }
    }

    /// Checks whether a code could be redeemed right now, optionally for a
    /// specific account. Read-only; the definitive answer is always given by
    /// [`redeem`](Self::redeem).
    pub async fn validate(
        &self,
        code: &PromoCode,
        account_id: Option<&AccountId>,
    ) -> Result<ValidationReport, DomainError> {
        let Some(entry) = self.ledger.find(code).await? else {
            return Ok(ValidationReport::invalid(RedemptionDenied::NotFound));
        };

        Ok(match entry.check_redeemable(account_id, Timestamp::now()) {
            Ok(()) => ValidationReport::valid(),
            Err(reason) => ValidationReport::invalid(reason),
        })
    }

    /// Redeems a code for an account and applies its entitlement effect.
    ///
    /// The entitlement mutation completes (and the account cache entry is
    /// invalidated) before this returns, so the caller can answer the user
    /// definitively.
    ///
    /// # Errors
    ///
    /// - [`RedemptionError::Invalid`] with the specific reason when any
    ///   redeemability predicate fails
    /// - [`RedemptionError::Infrastructure`] on storage failures or when the
    ///   account does not exist
    pub async fn redeem(
        &self,
        code: &PromoCode,
        account_id: AccountId,
    ) -> Result<PromoCodeEntry, RedemptionError> {
        let account = self
            .accounts
            .find_by_id(&account_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::AccountNotFound,
                    format!("account {} not found", account_id),
                )
            })?;

        // 1. Validate first for a fast, precise rejection.
        let report = self.validate(code, Some(&account_id)).await?;
        if let Some(reason) = report.reason {
            self.audit_rejection(code, account_id, &reason).await;
            return Err(RedemptionError::Invalid(reason));
        }

        // 2. The atomic conditional update is the authoritative decision;
        //    a concurrent redemption between step 1 and here surfaces as a
        //    rejection, never as a broken counter.
        let entry = match self.ledger.redeem(code, account_id).await? {
            RedeemOutcome::Redeemed(entry) => entry,
            RedeemOutcome::Rejected(reason) => {
                self.audit_rejection(code, account_id, &reason).await;
                return Err(RedemptionError::Invalid(reason));
            }
        };

        // 3. Apply the entitlement effect before answering.
        self.apply_effect(&entry, account).await?;

        self.audit
            .record(AuditRecord::redemption(
                code.as_str(),
                account_id,
                AuditOutcome::Success,
                Some(format!("code={} kind={}", code, entry.kind)),
            ))
            .await;

        tracing::info!(
            code = %code,
            account_id = %account_id,
            kind = %entry.kind,
            used_count = entry.used_count,
            "promo code redeemed"
        );

        Ok(entry)
    }

    async fn apply_effect(
        &self,
        entry: &PromoCodeEntry,
        account: Account,
    ) -> Result<(), DomainError> {
        if !entry.kind.mutates_entitlement() {
            // Discounts are applied by the billing provider at invoice time.
            return Ok(());
        }

        let _guard = self.locks.acquire(account.id).await;

        let mut account = self
            .accounts
            .find_by_id(&account.id)
            .await?
            .unwrap_or(account);

        match entry.kind {
            PromoCodeKind::FreeMonth => account.extend_period_months(1),
            PromoCodeKind::FreeYear => account.extend_period_months(12),
            PromoCodeKind::Lifetime => account.grant_lifetime(),
            PromoCodeKind::DiscountPercent | PromoCodeKind::DiscountAmount => unreachable!(),
        }

        self.accounts.update(&account).await?;
        self.cache.invalidate(&account.external_id).await;
        Ok(())
    }

    async fn audit_rejection(
        &self,
        code: &PromoCode,
        account_id: AccountId,
        reason: &RedemptionDenied,
    ) {
        self.audit
            .record(AuditRecord::redemption(
                code.as_str(),
                account_id,
                AuditOutcome::Failure,
                Some(format!("code={} reason={}", code, reason)),
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryAccountCache, InMemoryAccountRepository, InMemoryAuditLog,
        InMemoryPromoCodeRepository,
    };
    use crate::domain::account::SubscriptionStatus;
    use crate::domain::foundation::ExternalIdentityId;

    struct Fixture {
        coordinator: RedemptionCoordinator,
        ledger: Arc<InMemoryPromoCodeRepository>,
        accounts: Arc<InMemoryAccountRepository>,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(InMemoryPromoCodeRepository::new());
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let coordinator = RedemptionCoordinator::new(
            ledger.clone(),
            accounts.clone(),
            Arc::new(InMemoryAccountCache::new()),
            Arc::new(InMemoryAuditLog::new()),
            AccountLocks::new(),
        );
        Fixture {
            coordinator,
            ledger,
            accounts,
        }
    }

    fn code(s: &str) -> PromoCode {
        PromoCode::try_new(s).unwrap()
    }

    async fn seed_code(
        ledger: &InMemoryPromoCodeRepository,
        s: &str,
        kind: PromoCodeKind,
        limit: Option<u32>,
    ) {
        let entry = PromoCodeEntry::new(
            code(s),
            kind,
            None,
            limit,
            Timestamp::now().add_days(-1),
            None,
        )
        .unwrap();
        ledger.insert(&entry).await.unwrap();
    }

    async fn seed_account(accounts: &InMemoryAccountRepository, tag: &str) -> Account {
        let account = Account::register(
            ExternalIdentityId::new(format!("idp|{}", tag)).unwrap(),
            format!("{}@example.com", tag),
            None,
            14,
        );
        accounts.create(&account).await.unwrap();
        account
    }

    #[tokio::test]
    async fn validate_reports_unknown_code() {
        let f = fixture();
        let report = f.coordinator.validate(&code("NOPE99"), None).await.unwrap();
        assert!(!report.valid);
        assert_eq!(report.reason, Some(RedemptionDenied::NotFound));
    }

    #[tokio::test]
    async fn validate_passes_open_code() {
        let f = fixture();
        seed_code(&f.ledger, "OPEN26", PromoCodeKind::FreeMonth, Some(10)).await;

        let report = f.coordinator.validate(&code("OPEN26"), None).await.unwrap();
        assert!(report.valid);
        assert!(report.reason.is_none());
    }

    #[tokio::test]
    async fn redeem_free_month_extends_period_one_calendar_month() {
        let f = fixture();
        seed_code(&f.ledger, "ONEMONTH", PromoCodeKind::FreeMonth, None).await;
        let mut account = seed_account(&f.accounts, "amy").await;
        let end = Timestamp::from_unix_secs(1_736_467_200); // 2025-01-10
        account.subscription.current_period_end = Some(end);
        f.accounts.update(&account).await.unwrap();

        f.coordinator.redeem(&code("ONEMONTH"), account.id).await.unwrap();

        let stored = f.accounts.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(
            stored.subscription.current_period_end,
            Some(end.add_calendar_months(1)) // 2025-02-10
        );
        assert_eq!(stored.subscription.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn redeem_free_year_extends_twelve_months() {
        let f = fixture();
        seed_code(&f.ledger, "ONEYEAR", PromoCodeKind::FreeYear, None).await;
        let mut account = seed_account(&f.accounts, "bob").await;
        let end = Timestamp::from_unix_secs(1_736_467_200);
        account.subscription.current_period_end = Some(end);
        f.accounts.update(&account).await.unwrap();

        f.coordinator.redeem(&code("ONEYEAR"), account.id).await.unwrap();

        let stored = f.accounts.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(
            stored.subscription.current_period_end,
            Some(end.add_calendar_months(12))
        );
    }

    #[tokio::test]
    async fn redeem_lifetime_grants_far_future_entitlement() {
        let f = fixture();
        seed_code(&f.ledger, "FOREVER", PromoCodeKind::Lifetime, Some(1)).await;
        let account = seed_account(&f.accounts, "cat").await;

        f.coordinator.redeem(&code("FOREVER"), account.id).await.unwrap();

        let stored = f.accounts.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.subscription.status, SubscriptionStatus::Active);
        assert_eq!(stored.subscription.current_period_end.unwrap().year(), 9999);
    }

    #[tokio::test]
    async fn redeem_discount_does_not_touch_entitlement() {
        let f = fixture();
        let entry = PromoCodeEntry::new(
            code("HALF"),
            PromoCodeKind::DiscountPercent,
            Some(50),
            None,
            Timestamp::now().add_days(-1),
            None,
        )
        .unwrap();
        f.ledger.insert(&entry).await.unwrap();
        let account = seed_account(&f.accounts, "dan").await;
        let before = f
            .accounts
            .find_by_id(&account.id)
            .await
            .unwrap()
            .unwrap()
            .subscription;

        f.coordinator.redeem(&code("HALF"), account.id).await.unwrap();

        let after = f
            .accounts
            .find_by_id(&account.id)
            .await
            .unwrap()
            .unwrap()
            .subscription;
        assert_eq!(before.status, after.status);
        assert_eq!(before.current_period_end, after.current_period_end);
        // The ledger still recorded the use.
        let stored = f.ledger.find(&code("HALF")).await.unwrap().unwrap();
        assert_eq!(stored.used_count, 1);
    }

    #[tokio::test]
    async fn second_redemption_by_same_account_fails_regardless_of_headroom() {
        let f = fixture();
        seed_code(&f.ledger, "ONCE", PromoCodeKind::FreeMonth, Some(100)).await;
        let account = seed_account(&f.accounts, "eve").await;

        f.coordinator.redeem(&code("ONCE"), account.id).await.unwrap();
        let second = f.coordinator.redeem(&code("ONCE"), account.id).await;

        assert!(matches!(
            second,
            Err(RedemptionError::Invalid(RedemptionDenied::AlreadyRedeemed))
        ));
        let stored = f.ledger.find(&code("ONCE")).await.unwrap().unwrap();
        assert_eq!(stored.used_count, 1);
    }

    #[tokio::test]
    async fn redeem_for_unknown_account_is_infrastructure_error() {
        let f = fixture();
        seed_code(&f.ledger, "OPEN26", PromoCodeKind::FreeMonth, None).await;

        let result = f.coordinator.redeem(&code("OPEN26"), AccountId::new()).await;

        assert!(matches!(result, Err(RedemptionError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn exhausted_code_rejects_with_counts() {
        let f = fixture();
        seed_code(&f.ledger, "SCARCE", PromoCodeKind::FreeMonth, Some(1)).await;
        let first = seed_account(&f.accounts, "first").await;
        let second = seed_account(&f.accounts, "second").await;

        f.coordinator.redeem(&code("SCARCE"), first.id).await.unwrap();
        let result = f.coordinator.redeem(&code("SCARCE"), second.id).await;

        assert!(matches!(
            result,
            Err(RedemptionError::Invalid(RedemptionDenied::Exhausted { used: 1, limit: 1 }))
        ));
    }
}
