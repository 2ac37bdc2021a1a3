//! In-memory PromoCodeRepository implementation.
//!
//! The redeem path holds one lock across predicate evaluation and mutation,
//! matching the atomicity the Postgres adapter gets from a guarded UPDATE.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{AccountId, DomainError};
use crate::domain::promo::{PromoCode, PromoCodeEntry, RedemptionDenied};
use crate::ports::{InsertOutcome, PromoCodeRepository, RedeemOutcome};

/// HashMap-backed promo ledger.
#[derive(Default)]
pub struct InMemoryPromoCodeRepository {
    entries: Mutex<HashMap<String, PromoCodeEntry>>,
}

impl InMemoryPromoCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromoCodeRepository for InMemoryPromoCodeRepository {
    async fn insert(&self, entry: &PromoCodeEntry) -> Result<InsertOutcome, DomainError> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(entry.code.as_str()) {
            return Ok(InsertOutcome::DuplicateCode);
        }
        entries.insert(entry.code.as_str().to_string(), entry.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find(&self, code: &PromoCode) -> Result<Option<PromoCodeEntry>, DomainError> {
        Ok(self.entries.lock().await.get(code.as_str()).cloned())
    }

    async fn redeem(
        &self,
        code: &PromoCode,
        account_id: AccountId,
    ) -> Result<RedeemOutcome, DomainError> {
        // Check and mutate under the same lock; concurrent redeemers
        // serialize here.
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get_mut(code.as_str()) else {
            return Ok(RedeemOutcome::Rejected(RedemptionDenied::NotFound));
        };
        match entry.record_redemption(account_id) {
            Ok(()) => Ok(RedeemOutcome::Redeemed(entry.clone())),
            Err(reason) => Ok(RedeemOutcome::Rejected(reason)),
        }
    }

    async fn list(&self) -> Result<Vec<PromoCodeEntry>, DomainError> {
        let mut all: Vec<_> = self.entries.lock().await.values().cloned().collect();
        all.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
        Ok(all)
    }

    async fn set_active(&self, code: &PromoCode, active: bool) -> Result<bool, DomainError> {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(code.as_str()) {
            Some(entry) => {
                entry.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::promo::PromoCodeKind;
    use std::sync::Arc;

    fn entry(code: &str, limit: Option<u32>) -> PromoCodeEntry {
        PromoCodeEntry::new(
            PromoCode::try_new(code).unwrap(),
            PromoCodeKind::FreeMonth,
            None,
            limit,
            Timestamp::now().add_days(-1),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_reports_duplicates_as_outcome() {
        let repo = InMemoryPromoCodeRepository::new();
        assert_eq!(
            repo.insert(&entry("GYM10", None)).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            repo.insert(&entry("GYM10", None)).await.unwrap(),
            InsertOutcome::DuplicateCode
        );
    }

    #[tokio::test]
    async fn redeem_unknown_code_rejects_not_found() {
        let repo = InMemoryPromoCodeRepository::new();
        let outcome = repo
            .redeem(&PromoCode::try_new("GHOST1").unwrap(), AccountId::new())
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            RedeemOutcome::Rejected(RedemptionDenied::NotFound)
        ));
    }

    #[tokio::test]
    async fn concurrent_redeems_never_exceed_limit() {
        let repo = Arc::new(InMemoryPromoCodeRepository::new());
        let code = PromoCode::try_new("SCARCE").unwrap();
        repo.insert(&entry("SCARCE", Some(10))).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let repo = repo.clone();
            let code = code.clone();
            handles.push(tokio::spawn(async move {
                repo.redeem(&code, AccountId::new()).await.unwrap()
            }));
        }

        let mut redeemed = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), RedeemOutcome::Redeemed(_)) {
                redeemed += 1;
            }
        }

        assert_eq!(redeemed, 10);
        let stored = repo.find(&code).await.unwrap().unwrap();
        assert_eq!(stored.used_count, 10);
        assert_eq!(stored.used_by.len(), 10);
    }

    #[tokio::test]
    async fn set_active_flips_flag_and_reports_missing() {
        let repo = InMemoryPromoCodeRepository::new();
        let code = PromoCode::try_new("GYM10").unwrap();
        repo.insert(&entry("GYM10", None)).await.unwrap();

        assert!(repo.set_active(&code, false).await.unwrap());
        assert!(!repo.find(&code).await.unwrap().unwrap().is_active);

        assert!(!repo
            .set_active(&PromoCode::try_new("GHOST1").unwrap(), false)
            .await
            .unwrap());
    }
}
