//! Billing domain - payment provider events and their translation into
//! entitlement state.
//!
//! Nothing in this module trusts client-supplied data: events enter through
//! the signature verifier and only then reach the processor.

mod account_locks;
mod errors;
mod payment_event;
mod processor;
mod webhook_verifier;

pub use account_locks::AccountLocks;
pub use errors::WebhookError;
pub use payment_event::{
    InvoiceSnapshot, PaymentEvent, PaymentEventData, PaymentEventType, SubscriptionSnapshot,
};
pub use processor::{PaymentEventProcessor, ProcessOutcome};
pub use webhook_verifier::PaymentWebhookVerifier;
