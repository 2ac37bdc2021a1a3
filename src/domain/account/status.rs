//! Subscription status lifecycle.

use serde::{Deserialize, Serialize};

/// Current state of an account's subscription.
///
/// The payment provider is authoritative: the event processor overwrites this
/// wholesale from provider snapshots rather than transitioning incrementally,
/// which keeps event redelivery idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Trial period after account creation. Access granted until
    /// `trial_ends_at`.
    Trial,

    /// Paid subscription in good standing.
    Active,

    /// User requested cancellation; access continues until period end.
    Canceled,

    /// Subscription ended. No access until resubscription.
    Expired,
}

impl SubscriptionStatus {
    /// Returns true if this status grants access to paid features.
    ///
    /// Canceled retains access because cancellation takes effect at period
    /// end; the period check lives on the aggregate.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Trial | SubscriptionStatus::Active | SubscriptionStatus::Canceled
        )
    }

    /// Stable string form used in persistence and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// Parses the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(SubscriptionStatus::Trial),
            "active" => Some(SubscriptionStatus::Active),
            "canceled" => Some(SubscriptionStatus::Canceled),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }

    /// Maps a provider-reported status string to the internal status.
    ///
    /// `trialing -> Trial`, `active -> Active`, `canceled -> Canceled`,
    /// anything else (past_due, incomplete, unpaid, paused, future additions)
    /// maps to `Expired`.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "trialing" => SubscriptionStatus::Trial,
            "active" => SubscriptionStatus::Active,
            "canceled" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::Expired,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
