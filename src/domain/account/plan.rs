//! Subscription plan.

use serde::{Deserialize, Serialize};

/// Billing plan the account subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Monthly,
    Yearly,
}

impl SubscriptionPlan {
    /// Stable string form used in persistence and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Monthly => "monthly",
            SubscriptionPlan::Yearly => "yearly",
        }
    }

    /// Parses the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(SubscriptionPlan::Monthly),
            "yearly" => Some(SubscriptionPlan::Yearly),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
