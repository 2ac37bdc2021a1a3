//! Identity provider adapters.

mod mock;
mod oidc;

pub use mock::MockIdentityProvider;
pub use oidc::{OidcConfig, OidcIdentityProvider};
