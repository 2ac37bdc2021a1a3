//! OIDC adapter for bearer-token verification.
//!
//! Validates JWTs issued by the identity provider:
//!
//! 1. Fetch JWKS from the provider's well-known endpoint (cached)
//! 2. Validate the signature against the matching public key
//! 3. Validate issuer, audience, and expiry claims
//! 4. Map claims to a [`VerifiedIdentity`]

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::foundation::ExternalIdentityId;
use crate::ports::{IdentityError, IdentityProvider, VerifiedIdentity};

/// Configuration for the OIDC adapter.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Issuer URL; also the base for JWKS discovery.
    pub issuer_url: String,

    /// Expected audience claim.
    pub audience: String,

    /// How long to cache JWKS before refetching. Defaults to one hour.
    pub jwks_cache_duration: Option<Duration>,
}

impl OidcConfig {
    pub fn new(issuer_url: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer_url: issuer_url.into(),
            audience: audience.into(),
            jwks_cache_duration: None,
        }
    }

    fn jwks_url(&self) -> String {
        format!(
            "{}/.well-known/jwks.json",
            self.issuer_url.trim_end_matches('/')
        )
    }
}

/// Claims we consume from provider tokens.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,

    #[serde(default)]
    email: Option<String>,

    #[serde(default)]
    email_verified: Option<bool>,

    #[serde(default)]
    name: Option<String>,
}

struct JwksCache {
    jwks: JwkSet,
    fetched_at: Instant,
    cache_duration: Duration,
}

impl JwksCache {
    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() > self.cache_duration
    }
}

/// Production implementation of [`IdentityProvider`].
pub struct OidcIdentityProvider {
    config: OidcConfig,
    http_client: reqwest::Client,
    jwks_cache: RwLock<Option<JwksCache>>,
}

impl OidcIdentityProvider {
    /// Creates the adapter. JWKS are fetched lazily on first verification.
    pub fn new(config: OidcConfig) -> Result<Self, IdentityError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IdentityError::Unavailable(format!("http client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            jwks_cache: RwLock::new(None),
        })
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, IdentityError> {
        let url = self.config.jwks_url();
        tracing::debug!(url = %url, "fetching JWKS");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("JWKS fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(IdentityError::Unavailable(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("JWKS parse failed: {}", e)))
    }

    async fn get_jwks(&self) -> Result<JwkSet, IdentityError> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some(ref cached) = *cache {
                if !cached.is_expired() {
                    return Ok(cached.jwks.clone());
                }
            }
        }

        let jwks = self.fetch_jwks().await?;

        let mut cache = self.jwks_cache.write().await;
        *cache = Some(JwksCache {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
            cache_duration: self
                .config
                .jwks_cache_duration
                .unwrap_or(Duration::from_secs(3600)),
        });

        Ok(jwks)
    }

    fn find_decoding_key(
        &self,
        header: &jsonwebtoken::Header,
        jwks: &JwkSet,
    ) -> Result<(DecodingKey, Algorithm), IdentityError> {
        let kid = header
            .kid
            .as_ref()
            .ok_or_else(|| IdentityError::InvalidToken("missing kid header".to_string()))?;

        let jwk = jwks
            .find(kid)
            .ok_or_else(|| IdentityError::InvalidToken(format!("no key for kid {}", kid)))?;

        let algorithm = match jwk.common.key_algorithm {
            Some(jsonwebtoken::jwk::KeyAlgorithm::RS256) | None => Algorithm::RS256,
            Some(jsonwebtoken::jwk::KeyAlgorithm::RS384) => Algorithm::RS384,
            Some(jsonwebtoken::jwk::KeyAlgorithm::RS512) => Algorithm::RS512,
            Some(jsonwebtoken::jwk::KeyAlgorithm::ES256) => Algorithm::ES256,
            Some(other) => {
                return Err(IdentityError::InvalidToken(format!(
                    "unsupported algorithm {:?}",
                    other
                )));
            }
        };

        let decoding_key = DecodingKey::from_jwk(jwk)
            .map_err(|e| IdentityError::InvalidToken(format!("bad jwk: {}", e)))?;

        Ok((decoding_key, algorithm))
    }
}

#[async_trait]
impl IdentityProvider for OidcIdentityProvider {
    async fn verify_bearer(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let header = decode_header(token)
            .map_err(|e| IdentityError::InvalidToken(format!("bad header: {}", e)))?;

        let jwks = self.get_jwks().await?;
        let (key, algorithm) = self.find_decoding_key(&header, &jwks)?;

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&self.config.issuer_url]);
        validation.set_audience(&[&self.config.audience]);

        let data = decode::<Claims>(token, &key, &validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        let claims = data.claims;
        if claims.email_verified == Some(false) {
            return Err(IdentityError::InvalidToken("email not verified".to_string()));
        }
        let email = claims
            .email
            .ok_or_else(|| IdentityError::InvalidToken("token carries no email".to_string()))?;

        Ok(VerifiedIdentity {
            external_id: ExternalIdentityId::new(claims.sub)
                .map_err(|e| IdentityError::InvalidToken(e.to_string()))?,
            email,
            display_name: claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwks_url_is_derived_from_issuer() {
        let config = OidcConfig::new("https://auth.example.com/", "peakform-api");
        assert_eq!(
            config.jwks_url(),
            "https://auth.example.com/.well-known/jwks.json"
        );
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_without_network() {
        let provider =
            OidcIdentityProvider::new(OidcConfig::new("https://auth.example.com", "aud")).unwrap();

        let result = provider.verify_bearer("not-a-jwt").await;

        assert!(matches!(result, Err(IdentityError::InvalidToken(_))));
    }
}
