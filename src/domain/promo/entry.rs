//! Promo code ledger entry.
//!
//! One entry per issued code, tracking its benefit, usage counters, and
//! per-account redemption history.
//!
//! # Invariants
//!
//! - `used_count <= usage_limit` whenever a limit is set.
//! - An account id appears in `used_by` at most once.
//!
//! Both invariants must hold under concurrent redemption, which is why the
//! ledger port exposes a single conditional-update primitive rather than
//! separate read and write operations.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, Timestamp, ValidationError};

use super::code::PromoCode;
use super::errors::RedemptionDenied;

/// Benefit granted by a promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoCodeKind {
    /// Extends the entitlement period by one calendar month.
    FreeMonth,
    /// Extends the entitlement period by twelve calendar months.
    FreeYear,
    /// Grants a never-expiring entitlement.
    Lifetime,
    /// Percent discount applied by the billing provider at invoice time.
    DiscountPercent,
    /// Fixed-amount discount applied by the billing provider at invoice time.
    DiscountAmount,
}

impl PromoCodeKind {
    /// Whether this kind requires a numeric value.
    pub fn requires_value(&self) -> bool {
        matches!(self, PromoCodeKind::DiscountPercent | PromoCodeKind::DiscountAmount)
    }

    /// Whether redeeming this kind mutates the account's entitlement
    /// directly. Discount kinds are informational only; the billing provider
    /// applies them at invoice time.
    pub fn mutates_entitlement(&self) -> bool {
        matches!(
            self,
            PromoCodeKind::FreeMonth | PromoCodeKind::FreeYear | PromoCodeKind::Lifetime
        )
    }

    /// Stable string form used in persistence and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            PromoCodeKind::FreeMonth => "free_month",
            PromoCodeKind::FreeYear => "free_year",
            PromoCodeKind::Lifetime => "lifetime",
            PromoCodeKind::DiscountPercent => "discount_percent",
            PromoCodeKind::DiscountAmount => "discount_amount",
        }
    }

    /// Parses the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free_month" => Some(PromoCodeKind::FreeMonth),
            "free_year" => Some(PromoCodeKind::FreeYear),
            "lifetime" => Some(PromoCodeKind::Lifetime),
            "discount_percent" => Some(PromoCodeKind::DiscountPercent),
            "discount_amount" => Some(PromoCodeKind::DiscountAmount),
            _ => None,
        }
    }
}

impl std::fmt::Display for PromoCodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A promo code as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCodeEntry {
    /// The code itself; unique across the ledger.
    pub code: PromoCode,

    /// Benefit kind.
    pub kind: PromoCodeKind,

    /// Numeric value; meaning depends on kind. Percent kinds carry 0-100,
    /// amount kinds carry cents. Non-monetary kinds carry none.
    pub value: Option<i64>,

    /// Maximum total redemptions; unbounded when absent.
    pub usage_limit: Option<u32>,

    /// Redemptions so far.
    pub used_count: u32,

    /// Accounts that redeemed this code.
    pub used_by: Vec<AccountId>,

    /// Start of the validity window.
    pub valid_from: Timestamp,

    /// End of the validity window; open-ended when absent.
    pub valid_until: Option<Timestamp>,

    /// Administrative kill switch.
    pub is_active: bool,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PromoCodeEntry {
    /// Creates a new ledger entry, validating the kind/value pairing.
    ///
    /// # Errors
    ///
    /// - percent kinds require a value in 0-100
    /// - amount kinds require a non-negative value
    /// - non-monetary kinds must not carry a value
    pub fn new(
        code: PromoCode,
        kind: PromoCodeKind,
        value: Option<i64>,
        usage_limit: Option<u32>,
        valid_from: Timestamp,
        valid_until: Option<Timestamp>,
    ) -> Result<Self, ValidationError> {
        match (kind, value) {
            (PromoCodeKind::DiscountPercent, Some(v)) if !(0..=100).contains(&v) => {
                return Err(ValidationError::out_of_range("value", 0, 100, v));
            }
            (PromoCodeKind::DiscountPercent, None) | (PromoCodeKind::DiscountAmount, None) => {
                return Err(ValidationError::empty_field("value"));
            }
            (PromoCodeKind::DiscountAmount, Some(v)) if v < 0 => {
                return Err(ValidationError::out_of_range("value", 0, i64::MAX, v));
            }
            (k, Some(_)) if !k.requires_value() => {
                return Err(ValidationError::invalid_format(
                    "value",
                    format!("kind '{}' does not take a value", k),
                ));
            }
            _ => {}
        }

        let now = Timestamp::now();
        Ok(Self {
            code,
            kind,
            value,
            usage_limit,
            used_count: 0,
            used_by: Vec::new(),
            valid_from,
            valid_until,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checks whether this code can be redeemed at `now`, optionally by a
    /// specific account.
    ///
    /// Checks run in a fixed order; the first failure is the reported
    /// reason: active flag, window start, window end, usage limit, prior
    /// redemption by the account.
    pub fn check_redeemable(
        &self,
        account_id: Option<&AccountId>,
        now: Timestamp,
    ) -> Result<(), RedemptionDenied> {
        if !self.is_active {
            return Err(RedemptionDenied::Inactive);
        }
        if now.is_before(&self.valid_from) {
            return Err(RedemptionDenied::NotYetValid {
                starts_at: self.valid_from.to_string(),
            });
        }
        if let Some(until) = self.valid_until {
            if now.is_after(&until) {
                return Err(RedemptionDenied::Expired {
                    ended_at: until.to_string(),
                });
            }
        }
        if let Some(limit) = self.usage_limit {
            if self.used_count >= limit {
                return Err(RedemptionDenied::Exhausted {
                    used: self.used_count,
                    limit,
                });
            }
        }
        if let Some(account_id) = account_id {
            if self.used_by.contains(account_id) {
                return Err(RedemptionDenied::AlreadyRedeemed);
            }
        }
        Ok(())
    }

    /// Records a redemption by `account_id`.
    ///
    /// Callers must hold whatever exclusivity the storage layer provides;
    /// this method only re-checks the predicates and mutates in memory.
    pub fn record_redemption(&mut self, account_id: AccountId) -> Result<(), RedemptionDenied> {
        self.check_redeemable(Some(&account_id), Timestamp::now())?;
        self.used_count += 1;
        self.used_by.push(account_id);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Disables the code.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Timestamp::now();
    }
}
