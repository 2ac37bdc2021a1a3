//! Push notification dispatch port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::account::DeviceToken;

/// A push notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,

    /// Optional key/value data payload delivered alongside the notification.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
}

impl PushMessage {
    /// Creates a message with no data payload.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
        }
    }

    /// Adds a data payload entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Per-batch result of a multicast dispatch.
///
/// A multicast is not all-or-nothing: individual tokens fail independently
/// and a partial failure must not be treated as a total failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MulticastOutcome {
    pub success_count: u32,
    pub failure_count: u32,

    /// Tokens the provider rejected, for later cleanup.
    pub failed_tokens: Vec<DeviceToken>,
}

impl MulticastOutcome {
    /// True when every token failed.
    pub fn is_total_failure(&self) -> bool {
        self.success_count == 0 && self.failure_count > 0
    }
}

/// Errors from the push provider boundary.
#[derive(Debug, Clone, Error)]
pub enum PushError {
    /// Provider could not be reached or returned a server error.
    #[error("Push provider unavailable: {0}")]
    Unavailable(String),

    /// The bounded call timeout elapsed. Treated as failure, never success.
    #[error("Push dispatch timed out")]
    Timeout,

    /// The provider rejected the request as malformed.
    #[error("Push request rejected: {0}")]
    Rejected(String),
}

/// Port for delivering push notifications.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Sends one message to one device.
    async fn send(&self, message: &PushMessage, token: &DeviceToken) -> Result<(), PushError>;

    /// Sends one message to many devices in a single dispatch, reporting
    /// per-token success/failure.
    async fn send_multicast(
        &self,
        message: &PushMessage,
        tokens: &[DeviceToken],
    ) -> Result<MulticastOutcome, PushError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_sender_is_object_safe() {
        fn _accepts_dyn(_sender: &dyn PushSender) {}
    }

    #[test]
    fn message_builder_collects_data() {
        let msg = PushMessage::new("Title", "Body")
            .with_data("kind", "trial_expiry")
            .with_data("days_left", "2");
        assert_eq!(msg.data.len(), 2);
        assert_eq!(msg.data.get("days_left"), Some(&"2".to_string()));
    }

    #[test]
    fn partial_failure_is_not_total_failure() {
        let outcome = MulticastOutcome {
            success_count: 3,
            failure_count: 2,
            failed_tokens: Vec::new(),
        };
        assert!(!outcome.is_total_failure());
    }

    #[test]
    fn all_failed_is_total_failure() {
        let outcome = MulticastOutcome {
            success_count: 0,
            failure_count: 4,
            failed_tokens: Vec::new(),
        };
        assert!(outcome.is_total_failure());
    }

    #[test]
    fn empty_outcome_is_not_total_failure() {
        assert!(!MulticastOutcome::default().is_total_failure());
    }
}
