//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Auth issuer must use HTTPS in production")]
    IssuerMustBeHttps,

    #[error("Invalid payment API key format")]
    InvalidPaymentKey,

    #[error("Invalid payment webhook secret format")]
    InvalidWebhookSecret,

    #[error("Invalid push dispatch timeout")]
    InvalidPushTimeout,

    #[error("Scheduler UTC offset out of range (-12..=14)")]
    InvalidUtcOffset,

    #[error("Trial length out of range (1..=90 days)")]
    InvalidTrialDays,
}
