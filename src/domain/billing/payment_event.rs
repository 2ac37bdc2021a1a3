//! Payment provider webhook event types.
//!
//! Only the fields our processing consumes are captured; the rest of the
//! provider's event schema is ignored.

use serde::{Deserialize, Serialize};

/// A verified payment provider event.
///
/// Transient: only its effects on the entitlement store persist.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEvent {
    /// Provider-issued event id (logged, not used for deduplication).
    pub id: String,

    /// Event type string, e.g. "subscription.updated".
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp at which the provider created the event.
    pub created: i64,

    /// Event-specific payload.
    pub data: PaymentEventData,
}

/// Container for the event payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEventData {
    /// The object the event describes (shape depends on event type).
    pub object: serde_json::Value,
}

impl PaymentEvent {
    /// Parses the event type into a known variant.
    pub fn parsed_type(&self) -> PaymentEventType {
        PaymentEventType::from_str(&self.event_type)
    }

    /// Attempts to deserialize the payload object as the given type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// Event types the processor acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventType {
    /// Subscription state changed at the provider.
    SubscriptionUpdated,
    /// Subscription removed at the provider.
    SubscriptionDeleted,
    /// Invoice paid; covers trial-to-paid and recovery after retries.
    InvoicePaymentSucceeded,
    /// Invoice payment failed. Observability only.
    InvoicePaymentFailed,
    /// Anything else. Acknowledged and ignored for forward compatibility.
    Unknown,
}

impl PaymentEventType {
    pub fn from_str(s: &str) -> Self {
        match s {
            "subscription.updated" => Self::SubscriptionUpdated,
            "subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionUpdated => "subscription.updated",
            Self::SubscriptionDeleted => "subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown => "unknown",
        }
    }
}

/// Snapshot of the provider's subscription object embedded in an event.
///
/// Period bounds are provider-authoritative and copied verbatim into the
/// entitlement store, never merged.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionSnapshot {
    /// Provider subscription reference.
    pub id: String,

    /// Provider customer reference, used to resolve the owning account.
    pub customer: String,

    /// Provider-side status string ("trialing", "active", "canceled", ...).
    pub status: String,

    /// Billing plan identifier ("monthly" / "yearly"), when present.
    #[serde(default)]
    pub plan: Option<String>,

    /// Unix timestamp of the current period start.
    #[serde(default)]
    pub current_period_start: Option<i64>,

    /// Unix timestamp of the current period end.
    #[serde(default)]
    pub current_period_end: Option<i64>,

    /// Whether the subscription cancels at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// Unix timestamp of the cancellation request, if any.
    #[serde(default)]
    pub canceled_at: Option<i64>,
}

/// Snapshot of the provider's invoice object embedded in an event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvoiceSnapshot {
    /// Provider customer reference.
    pub customer: String,

    /// Embedded subscription snapshot, when the invoice belongs to one.
    #[serde(default)]
    pub subscription: Option<SubscriptionSnapshot>,
}
