//! Promo code value object.
//!
//! Codes are uppercase alphanumeric, 3 to 20 characters. Input is
//! normalized to uppercase so users can type codes case-insensitively.

use crate::domain::foundation::ValidationError;
use serde::{Deserialize, Serialize};

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 20;

/// A validated promo code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PromoCode(String);

impl PromoCode {
    /// Creates a PromoCode from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the code is empty, outside 3-20
    /// characters, or contains non-alphanumeric characters.
    pub fn try_new(code: &str) -> Result<Self, ValidationError> {
        if code.is_empty() {
            return Err(ValidationError::empty_field("promo_code"));
        }

        let normalized = code.to_uppercase();

        if normalized.len() < MIN_LEN || normalized.len() > MAX_LEN {
            return Err(ValidationError::out_of_range(
                "promo_code_length",
                MIN_LEN as i64,
                MAX_LEN as i64,
                normalized.len() as i64,
            ));
        }

        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::invalid_format(
                "promo_code",
                "alphanumeric characters only",
            ));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PromoCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for PromoCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl TryFrom<String> for PromoCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(&value)
    }
}

impl From<PromoCode> for String {
    fn from(code: PromoCode) -> Self {
        code.0
    }
}
