//! Error types for payment webhook intake.

use http::StatusCode;
use thiserror::Error;

/// Errors raised while verifying and parsing a webhook request.
///
/// These cover the intake layer only. Once an event passes verification,
/// processing failures are logged and acknowledged rather than surfaced, so
/// the provider does not redeliver signature-valid events forever.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// Signed timestamp is older than the acceptance window.
    #[error("Timestamp too old")]
    TimestampTooOld,

    /// Signed timestamp is in the future beyond clock-skew tolerance.
    #[error("Timestamp in the future")]
    TimestampInFuture,

    /// Signature header or JSON payload could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl WebhookError {
    /// HTTP status returned to the provider.
    ///
    /// All intake failures are non-retryable client errors; a 2xx is only
    /// ever produced after verification succeeds.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::SignatureInvalid | WebhookError::TimestampTooOld => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::TimestampInFuture | WebhookError::ParseError(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_failures_map_to_unauthorized() {
        assert_eq!(
            WebhookError::SignatureInvalid.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::TimestampTooOld.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn parse_failures_map_to_bad_request() {
        assert_eq!(
            WebhookError::ParseError("bad json".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::TimestampInFuture.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn errors_display_a_reason() {
        assert_eq!(format!("{}", WebhookError::SignatureInvalid), "Invalid signature");
        assert_eq!(
            format!("{}", WebhookError::ParseError("truncated".to_string())),
            "Parse error: truncated"
        );
    }
}
