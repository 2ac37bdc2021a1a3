//! Mock identity provider for tests and local development.
//!
//! Accepts tokens of the form `mock:<subject>:<email>` and rejects
//! everything else.

use async_trait::async_trait;

use crate::domain::foundation::ExternalIdentityId;
use crate::ports::{IdentityError, IdentityProvider, VerifiedIdentity};

/// Token-format-based identity provider requiring no network.
#[derive(Default)]
pub struct MockIdentityProvider;

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self
    }

    /// Builds a token the mock will accept.
    pub fn token_for(subject: &str, email: &str) -> String {
        format!("mock:{}:{}", subject, email)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn verify_bearer(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let mut parts = token.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("mock"), Some(subject), Some(email)) if !subject.is_empty() => {
                Ok(VerifiedIdentity {
                    external_id: ExternalIdentityId::new(subject)
                        .map_err(|e| IdentityError::InvalidToken(e.to_string()))?,
                    email: email.to_string(),
                    display_name: None,
                })
            }
            _ => Err(IdentityError::InvalidToken("unrecognized token".to_string())),
        }
    }
}
