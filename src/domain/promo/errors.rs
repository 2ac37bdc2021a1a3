//! Redemption error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Reason a promo code cannot be redeemed right now.
///
/// User-visible and non-retryable. The checks that produce these run in a
/// fixed order (active flag, validity window start, validity window end,
/// usage limit, prior redemption) and the first failing check wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RedemptionDenied {
    /// Code does not exist in the ledger.
    NotFound,

    /// Code has been disabled by an administrator.
    Inactive,

    /// Validity window has not opened yet.
    NotYetValid {
        /// When the code becomes redeemable (RFC 3339).
        starts_at: String,
    },

    /// Validity window has closed.
    Expired {
        /// When the code stopped being redeemable (RFC 3339).
        ended_at: String,
    },

    /// Usage limit reached.
    Exhausted { used: u32, limit: u32 },

    /// This account already redeemed this code.
    AlreadyRedeemed,
}

impl RedemptionDenied {
    /// User-facing explanation.
    pub fn user_message(&self) -> String {
        match self {
            RedemptionDenied::NotFound => {
                "This promo code was not found. Please check and try again.".to_string()
            }
            RedemptionDenied::Inactive => "This promo code is no longer valid.".to_string(),
            RedemptionDenied::NotYetValid { starts_at } => {
                format!("This promo code is not active yet. It starts on {}.", starts_at)
            }
            RedemptionDenied::Expired { ended_at } => {
                format!("This promo code expired on {}.", ended_at)
            }
            RedemptionDenied::Exhausted { used, limit } => {
                format!("This promo code has been fully redeemed ({}/{} uses).", used, limit)
            }
            RedemptionDenied::AlreadyRedeemed => {
                "You have already used this promo code.".to_string()
            }
        }
    }
}

impl std::fmt::Display for RedemptionDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// Failure modes of a redemption attempt.
#[derive(Debug, Error)]
pub enum RedemptionError {
    /// The code cannot be applied, with the specific reason.
    #[error("Invalid redemption: {0}")]
    Invalid(RedemptionDenied),

    /// Infrastructure failure while reading or writing the ledger.
    #[error(transparent)]
    Infrastructure(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_message_shows_counts() {
        let reason = RedemptionDenied::Exhausted { used: 100, limit: 100 };
        let msg = reason.user_message();
        assert!(msg.contains("fully redeemed"));
        assert!(msg.contains("100/100"));
    }

    #[test]
    fn already_redeemed_message_says_already_used() {
        let msg = RedemptionDenied::AlreadyRedeemed.user_message();
        assert!(msg.contains("already used"));
    }

    #[test]
    fn expired_message_shows_date() {
        let reason = RedemptionDenied::Expired { ended_at: "2026-01-01".to_string() };
        assert!(reason.user_message().contains("2026-01-01"));
    }

    #[test]
    fn display_matches_user_message() {
        let reason = RedemptionDenied::NotFound;
        assert_eq!(format!("{}", reason), reason.user_message());
    }

    #[test]
    fn denied_reason_serializes_with_type_tag() {
        let reason = RedemptionDenied::Exhausted { used: 5, limit: 10 };
        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("\"type\":\"exhausted\""));
        assert!(json.contains("\"used\":5"));
    }

    #[test]
    fn denied_reason_deserializes() {
        let reason: RedemptionDenied = serde_json::from_str(r#"{"type":"not_found"}"#).unwrap();
        assert_eq!(reason, RedemptionDenied::NotFound);
    }
}
