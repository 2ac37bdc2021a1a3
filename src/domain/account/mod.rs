//! Account domain - identity, subscription entitlement, notification settings.
//!
//! The Account aggregate mirrors the payment provider's authoritative
//! subscription state; it never owns billing truth. Mutations to the
//! subscription sub-record come only from the payment event processor or the
//! promo redemption coordinator.

mod aggregate;
mod device_token;
mod plan;
mod reminder_time;
mod status;

pub use aggregate::{Account, NotificationSettings, SubscriptionRecord};
pub use device_token::DeviceToken;
pub use plan::SubscriptionPlan;
pub use reminder_time::ReminderTime;
pub use status::SubscriptionStatus;
