//! Audit log port.
//!
//! Every payment event branch and every redemption emits an audit record.
//! Recording is infallible from the caller's perspective: an audit sink that
//! cannot persist must log the loss itself rather than fail the operation it
//! is observing. Durable audit persistence is outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::account::SubscriptionStatus;
use crate::domain::foundation::{AccountId, Timestamp};

/// Outcome classification of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    /// Operation acknowledged without effect (unrecognized event types,
    /// no-op branches).
    Ignored,
    /// Acknowledged but flagged for operator review.
    Anomaly,
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub occurred_at: Timestamp,

    /// Dotted action name, e.g. `payment_event.subscription.updated` or
    /// `promo.redeem`.
    pub action: String,

    pub account_id: Option<AccountId>,
    pub before_status: Option<SubscriptionStatus>,
    pub after_status: Option<SubscriptionStatus>,
    pub outcome: AuditOutcome,
    pub detail: Option<String>,
}

impl AuditRecord {
    /// Record for a payment event applied to an account.
    pub fn payment_event(
        event_type: &str,
        account_id: AccountId,
        before: SubscriptionStatus,
        after: SubscriptionStatus,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            occurred_at: Timestamp::now(),
            action: format!("payment_event.{}", event_type),
            account_id: Some(account_id),
            before_status: Some(before),
            after_status: Some(after),
            outcome,
            detail: None,
        }
    }

    /// Record for a payment event that produced no account mutation.
    pub fn payment_event_ignored(event_type: &str, detail: impl Into<String>) -> Self {
        Self {
            occurred_at: Timestamp::now(),
            action: format!("payment_event.{}", event_type),
            account_id: None,
            before_status: None,
            after_status: None,
            outcome: AuditOutcome::Ignored,
            detail: Some(detail.into()),
        }
    }

    /// Record for an acknowledged-but-flagged condition.
    pub fn anomaly(action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            occurred_at: Timestamp::now(),
            action: action.into(),
            account_id: None,
            before_status: None,
            after_status: None,
            outcome: AuditOutcome::Anomaly,
            detail: Some(detail.into()),
        }
    }

    /// Record for a promo redemption attempt.
    pub fn redemption(
        code: &str,
        account_id: AccountId,
        outcome: AuditOutcome,
        detail: Option<String>,
    ) -> Self {
        Self {
            occurred_at: Timestamp::now(),
            action: "promo.redeem".to_string(),
            account_id: Some(account_id),
            before_status: None,
            after_status: None,
            outcome,
            detail: detail.or_else(|| Some(format!("code={}", code))),
        }
    }

    /// Attaches free-form detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Port for emitting audit records.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Records an audit entry. Must not fail the audited operation.
    async fn record(&self, record: AuditRecord);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_log_is_object_safe() {
        fn _accepts_dyn(_log: &dyn AuditLog) {}
    }

    #[test]
    fn payment_event_record_carries_status_transition() {
        let account_id = AccountId::new();
        let record = AuditRecord::payment_event(
            "subscription.updated",
            account_id,
            SubscriptionStatus::Trial,
            SubscriptionStatus::Active,
            AuditOutcome::Success,
        );

        assert_eq!(record.action, "payment_event.subscription.updated");
        assert_eq!(record.account_id, Some(account_id));
        assert_eq!(record.before_status, Some(SubscriptionStatus::Trial));
        assert_eq!(record.after_status, Some(SubscriptionStatus::Active));
    }

    #[test]
    fn anomaly_record_has_no_account() {
        let record = AuditRecord::anomaly("payment_event.resolve", "unknown customer cus_9");
        assert_eq!(record.outcome, AuditOutcome::Anomaly);
        assert!(record.account_id.is_none());
        assert!(record.detail.unwrap().contains("cus_9"));
    }

    #[test]
    fn redemption_record_defaults_detail_to_code() {
        let record = AuditRecord::redemption("GYM10", AccountId::new(), AuditOutcome::Success, None);
        assert_eq!(record.detail, Some("code=GYM10".to_string()));
    }
}
