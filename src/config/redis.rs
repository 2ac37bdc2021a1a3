//! Redis configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Redis configuration (account cache)
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// TTL for cached account entries in seconds
    #[serde(default = "default_account_ttl")]
    pub account_ttl_secs: u64,
}

impl RedisConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get account cache TTL as Duration
    pub fn account_ttl(&self) -> Duration {
        Duration::from_secs(self.account_ttl_secs)
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    5
}

fn default_account_ttl() -> u64 {
    60
}
