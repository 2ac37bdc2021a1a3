//! Device push token value object.

use crate::domain::foundation::ValidationError;
use serde::{Deserialize, Serialize};

/// Maximum accepted token length. FCM registration tokens run well under
/// this; anything longer is malformed input.
const MAX_TOKEN_LEN: usize = 4096;

/// An opaque push registration token for one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(String);

impl DeviceToken {
    /// Creates a DeviceToken, rejecting empty or oversized values.
    pub fn new(token: impl Into<String>) -> Result<Self, ValidationError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ValidationError::empty_field("device_token"));
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(ValidationError::out_of_range(
                "device_token_length",
                1,
                MAX_TOKEN_LEN as i64,
                token.len() as i64,
            ));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Tokens are credentials; show only a prefix in logs.
        let shown = self.0.chars().take(8).collect::<String>();
        write!(f, "{}…", shown)
    }
}
