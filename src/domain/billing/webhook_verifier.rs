//! Payment webhook signature verification.
//!
//! HMAC-SHA256 over `"{timestamp}.{payload}"` with the shared webhook
//! secret, compared in constant time. Timestamp bounds limit replay.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::payment_event::PaymentEvent;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future-dated events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components of the `Pay-Signature` header.
///
/// Format: `t=<unix timestamp>,v1=<hex hmac>`. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses the signature header string.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid signature hex".to_string())
                    })?);
                }
                _ => {
                    // Unknown fields are ignored for forward compatibility
                }
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        let signature =
            signature.ok_or_else(|| WebhookError::ParseError("missing signature".to_string()))?;

        Ok(SignatureHeader { timestamp, signature })
    }
}

/// Verifier for inbound payment webhooks.
pub struct PaymentWebhookVerifier {
    secret: String,
}

impl PaymentWebhookVerifier {
    /// Creates a verifier with the shared webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Verifies the signature and parses the payload into a [`PaymentEvent`].
    ///
    /// Verification happens before any payload parsing; a request with a bad
    /// signature never reaches business logic.
    ///
    /// # Errors
    ///
    /// - `SignatureInvalid` - HMAC mismatch
    /// - `TimestampTooOld` / `TimestampInFuture` - outside the replay window
    /// - `ParseError` - malformed header or JSON payload
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<PaymentEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if !constant_time_compare(&expected, &header.signature) {
            return Err(WebhookError::SignatureInvalid);
        }

        let event: PaymentEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        Ok(event)
    }

    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampTooOld);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::TimestampInFuture);
        }
        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes a hex signature for test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    const VALID_PAYLOAD: &str = r#"{"id":"evt_1","type":"subscription.updated","created":1704067200,"data":{"object":{}}}"#;

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_timestamp_and_signature() {
        let header_str = format!("t=1234567890,v1={}", "a".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.signature.len(), 32);
    }

    #[test]
    fn parse_header_ignores_unknown_fields() {
        let header_str = format!("t=1234567890,v1={},v2=future,scheme=hmac", "a".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_missing_signature_fails() {
        let result = SignatureHeader::parse("t=1234567890");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=not_hex");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_without_equals_fails() {
        let result = SignatureHeader::parse("t1234567890");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let verifier = PaymentWebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, VALID_PAYLOAD);
        let header = format!("t={},v1={}", timestamp, signature);

        let event = verifier
            .verify_and_parse(VALID_PAYLOAD.as_bytes(), &header)
            .unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, "subscription.updated");
    }

    #[test]
    fn verify_garbage_signature_fails() {
        let verifier = PaymentWebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!("t={},v1={}", timestamp, "a".repeat(64));

        let result = verifier.verify_and_parse(VALID_PAYLOAD.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let verifier = PaymentWebhookVerifier::new("wrong_secret");
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, VALID_PAYLOAD);
        let header = format!("t={},v1={}", timestamp, signature);

        let result = verifier.verify_and_parse(VALID_PAYLOAD.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let verifier = PaymentWebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, VALID_PAYLOAD);
        let header = format!("t={},v1={}", timestamp, signature);
        let tampered = VALID_PAYLOAD.replace("evt_1", "evt_2");

        let result = verifier.verify_and_parse(tampered.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_within_window_succeeds() {
        let verifier = PaymentWebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 120;
        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_too_old_fails() {
        let verifier = PaymentWebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 600;
        assert!(matches!(
            verifier.validate_timestamp(timestamp),
            Err(WebhookError::TimestampTooOld)
        ));
    }

    #[test]
    fn timestamp_slightly_in_future_succeeds() {
        let verifier = PaymentWebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() + 30;
        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_far_in_future_fails() {
        let verifier = PaymentWebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() + 120;
        assert!(matches!(
            verifier.validate_timestamp(timestamp),
            Err(WebhookError::TimestampInFuture)
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Payload Parsing
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_json_fails_after_signature_check() {
        let verifier = PaymentWebhookVerifier::new(TEST_SECRET);
        let payload = "not valid json";
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Constant-Time Comparison
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_basics() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
        assert!(constant_time_compare(&[], &[]));
    }
}
