//! Payment provider configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment provider configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Provider API key
    pub api_key: String,

    /// Webhook signing secret shared with the provider
    pub webhook_secret: String,
}

impl PaymentConfig {
    /// Check if using the provider's test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_API_KEY"));
        }
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_WEBHOOK_SECRET"));
        }

        // Key prefixes catch copy-paste mistakes before the first request.
        if !self.api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidPaymentKey);
        }
        if !self.webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str, secret: &str) -> PaymentConfig {
        PaymentConfig {
            api_key: api_key.to_string(),
            webhook_secret: secret.to_string(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config("sk_test_abc", "whsec_xyz").validate().is_ok());
        assert!(config("sk_live_abc", "whsec_xyz").validate().is_ok());
    }

    #[test]
    fn test_mode_detection() {
        assert!(config("sk_test_abc", "whsec_x").is_test_mode());
        assert!(!config("sk_live_abc", "whsec_x").is_test_mode());
    }

    #[test]
    fn wrong_api_key_prefix_rejected() {
        assert!(config("pk_test_abc", "whsec_xyz").validate().is_err());
    }

    #[test]
    fn wrong_webhook_secret_prefix_rejected() {
        assert!(config("sk_test_abc", "secret_xyz").validate().is_err());
    }

    #[test]
    fn empty_fields_rejected() {
        assert!(PaymentConfig::default().validate().is_err());
        assert!(config("sk_test_abc", "").validate().is_err());
    }
}
