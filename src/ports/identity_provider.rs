//! Identity provider port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ExternalIdentityId;

/// A verified identity returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Stable subject identifier, 1:1 with an account.
    pub external_id: ExternalIdentityId,

    /// Verified email address.
    pub email: String,

    /// Display name, when the provider carries one.
    pub display_name: Option<String>,
}

/// Errors from bearer-token verification.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// Token is expired, malformed, or fails validation.
    #[error("Invalid bearer token: {0}")]
    InvalidToken(String),

    /// The provider could not be reached.
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Port for verifying bearer tokens into stable identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies a bearer token and returns the identity it asserts.
    async fn verify_bearer(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn IdentityProvider) {}
    }
}
