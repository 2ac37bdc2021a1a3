//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Authentication configuration (OIDC identity provider)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Identity provider issuer URL
    pub issuer_url: String,

    /// Expected audience claim
    pub audience: String,

    /// Use the mock identity provider instead of OIDC (development only)
    #[serde(default)]
    pub use_mock: bool,
}

impl AuthConfig {
    /// Validate auth configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.use_mock {
            if *environment == Environment::Production {
                return Err(ValidationError::MissingRequired(
                    "AUTH issuer (mock provider is not allowed in production)",
                ));
            }
            return Ok(());
        }
        if self.issuer_url.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_ISSUER_URL"));
        }
        if self.audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_AUDIENCE"));
        }
        if *environment == Environment::Production && !self.issuer_url.starts_with("https://") {
            return Err(ValidationError::IssuerMustBeHttps);
        }
        Ok(())
    }
}
