//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `PEAKFORM`
//! prefix and `__` (double underscore) as the nesting separator.
//!
//! # Example
//!
//! ```no_run
//! use peakform::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod account;
mod auth;
mod database;
mod error;
mod payment;
mod push;
mod redis;
mod scheduler;
mod server;

pub use account::AccountConfig;
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use push::PushConfig;
pub use redis::RedisConfig;
pub use scheduler::SchedulerConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Redis configuration (account cache)
    pub redis: RedisConfig,

    /// Authentication configuration (OIDC identity provider)
    pub auth: AuthConfig,

    /// Payment provider configuration
    pub payment: PaymentConfig,

    /// Push notification configuration (FCM)
    pub push: PushConfig,

    /// Reminder scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Account policy configuration
    #[serde(default)]
    pub account: AccountConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Reads a `.env` file first when present (development), then
    /// environment variables like `PEAKFORM__DATABASE__URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PEAKFORM")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates all configuration sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.payment.validate()?;
        self.push.validate()?;
        self.scheduler.validate()?;
        self.account.validate()?;
        Ok(())
    }

    /// Check if running in production environment.
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
