//! Push notification configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Push notification configuration (FCM)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushConfig {
    /// FCM server key
    pub server_key: String,

    /// Endpoint override (tests / proxies)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Dispatch timeout in seconds. A timed-out dispatch counts as failed.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl PushConfig {
    /// Get dispatch timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate push configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.server_key.is_empty() {
            return Err(ValidationError::MissingRequired("PUSH_SERVER_KEY"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidPushTimeout);
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    10
}
