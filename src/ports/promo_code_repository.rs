//! Promo code ledger port.
//!
//! The redeem operation is the load-bearing piece: it must evaluate the
//! redeemability predicates and apply the increment/append as one atomic
//! conditional update. A separate validate-then-write sequence is a
//! double-redemption race and is not an acceptable implementation.

use async_trait::async_trait;

use crate::domain::foundation::{AccountId, DomainError};
use crate::domain::promo::{PromoCode, PromoCodeEntry, RedemptionDenied};

/// Result of inserting a new code into the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The code was inserted.
    Inserted,
    /// A code with the same value already exists. Used by bulk generation
    /// to detect collisions without treating them as errors.
    DuplicateCode,
}

/// Result of an atomic redemption attempt.
#[derive(Debug, Clone)]
pub enum RedeemOutcome {
    /// The update applied; the returned entry reflects the new counters.
    Redeemed(PromoCodeEntry),
    /// A predicate failed; nothing was written.
    Rejected(RedemptionDenied),
}

/// Repository port for the promo code ledger.
#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    /// Inserts a new ledger entry, reporting duplicate codes as an outcome
    /// rather than an error.
    async fn insert(&self, entry: &PromoCodeEntry) -> Result<InsertOutcome, DomainError>;

    /// Loads a ledger entry by code.
    async fn find(&self, code: &PromoCode) -> Result<Option<PromoCodeEntry>, DomainError>;

    /// Atomically increments `used_count` and appends `account_id` to
    /// `used_by`, guarded by the redeemability predicates (active, validity
    /// window, usage limit, no prior redemption by this account).
    ///
    /// Implementations must evaluate the guards and apply the mutation in a
    /// single conditional write; under concurrent calls the usage-limit and
    /// no-duplicate invariants must hold.
    async fn redeem(
        &self,
        code: &PromoCode,
        account_id: AccountId,
    ) -> Result<RedeemOutcome, DomainError>;

    /// Lists all ledger entries (admin surface).
    async fn list(&self) -> Result<Vec<PromoCodeEntry>, DomainError>;

    /// Flips the administrative active flag. Returns false when the code
    /// does not exist.
    async fn set_active(&self, code: &PromoCode, active: bool) -> Result<bool, DomainError>;
}
