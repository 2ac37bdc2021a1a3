//! Request/response DTOs for the HTTP surface.

use serde::{Deserialize, Serialize};

use crate::domain::promo::{PromoCodeEntry, RedemptionDenied};

/// Standard error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Webhook acknowledgment body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: String,
}

/// Entitlement summary for the authenticated account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: String,
    pub email: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_days_left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<String>,
}

/// Body for promo validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateCodeRequest {
    pub code: String,
}

/// Response for promo validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateCodeResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RedemptionDenied>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body for promo redemption.
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemCodeRequest {
    pub code: String,
}

/// Response for a successful redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemCodeResponse {
    pub code: String,
    pub kind: String,
    pub used_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
}

impl From<&PromoCodeEntry> for RedeemCodeResponse {
    fn from(entry: &PromoCodeEntry) -> Self {
        Self {
            code: entry.code.as_str().to_string(),
            kind: entry.kind.as_str().to_string(),
            used_count: entry.used_count,
            usage_limit: entry.usage_limit,
        }
    }
}

/// Body for admin code creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCodeRequest {
    pub code: String,
    pub kind: String,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub valid_from: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub valid_until: Option<chrono::DateTime<chrono::Utc>>,
}

/// Body for admin bulk generation.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkGenerateRequest {
    pub count: u32,
    pub prefix: String,
    pub kind: String,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub valid_from: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub valid_until: Option<chrono::DateTime<chrono::Utc>>,
}

/// Response for admin bulk generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkGenerateResponse {
    pub created: Vec<String>,
    pub collision_failures: u32,
}

/// Summary of a ledger entry for admin listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSummary {
    pub code: String,
    pub kind: String,
    pub used_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    pub is_active: bool,
}

impl From<&PromoCodeEntry> for CodeSummary {
    fn from(entry: &PromoCodeEntry) -> Self {
        Self {
            code: entry.code.as_str().to_string(),
            kind: entry.kind.as_str().to_string(),
            used_count: entry.used_count,
            usage_limit: entry.usage_limit,
            is_active: entry.is_active,
        }
    }
}
