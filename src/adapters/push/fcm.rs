//! FCM push adapter.
//!
//! Talks to the FCM HTTP endpoint with a bounded timeout. Multicast
//! responses carry one result per registration token; the adapter maps
//! those into a [`MulticastOutcome`] so callers can count failures without
//! treating a partial failure as a total one.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::account::DeviceToken;
use crate::ports::{MulticastOutcome, PushError, PushMessage, PushSender};

const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the FCM adapter.
#[derive(Clone)]
pub struct FcmConfig {
    /// FCM server key.
    pub server_key: Secret<String>,

    /// Endpoint override, mainly for tests.
    pub endpoint: String,

    /// Per-call timeout. A timed-out call is a failure, never a success.
    pub timeout: Duration,
}

impl FcmConfig {
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            server_key: Secret::new(server_key.into()),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct FcmRequest<'a> {
    registration_ids: Vec<&'a str>,
    notification: FcmNotification<'a>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    data: &'a HashMap<String, String>,
}

#[derive(Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    success: u32,
    #[serde(default)]
    failure: u32,
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    #[serde(default)]
    error: Option<String>,
}

/// Production implementation of [`PushSender`].
pub struct FcmPushSender {
    config: FcmConfig,
    http_client: reqwest::Client,
}

impl FcmPushSender {
    pub fn new(config: FcmConfig) -> Result<Self, PushError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PushError::Unavailable(format!("http client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn dispatch(
        &self,
        message: &PushMessage,
        tokens: &[DeviceToken],
    ) -> Result<FcmResponse, PushError> {
        let request = FcmRequest {
            registration_ids: tokens.iter().map(|t| t.as_str()).collect(),
            notification: FcmNotification {
                title: &message.title,
                body: &message.body,
            },
            data: &message.data,
        };

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .header(
                "Authorization",
                format!("key={}", self.config.server_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PushError::Timeout
                } else {
                    PushError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Rejected(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            return Err(PushError::Unavailable(format!("FCM returned {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| PushError::Unavailable(format!("unreadable FCM response: {}", e)))
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(&self, message: &PushMessage, token: &DeviceToken) -> Result<(), PushError> {
        let response = self.dispatch(message, std::slice::from_ref(token)).await?;
        if response.failure > 0 {
            let error = response
                .results
                .first()
                .and_then(|r| r.error.clone())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(PushError::Rejected(error));
        }
        Ok(())
    }

    async fn send_multicast(
        &self,
        message: &PushMessage,
        tokens: &[DeviceToken],
    ) -> Result<MulticastOutcome, PushError> {
        if tokens.is_empty() {
            return Ok(MulticastOutcome::default());
        }

        let response = self.dispatch(message, tokens).await?;

        let mut failed_tokens = Vec::new();
        for (i, result) in response.results.iter().enumerate() {
            if let Some(error) = &result.error {
                if let Some(token) = tokens.get(i) {
                    tracing::debug!(token = %token, error = %error, "token delivery failed");
                    failed_tokens.push(token.clone());
                }
            }
        }

        Ok(MulticastOutcome {
            success_count: response.success,
            failure_count: response.failure,
            failed_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_tokens_and_notification() {
        let data = HashMap::from([("kind".to_string(), "reminder".to_string())]);
        let request = FcmRequest {
            registration_ids: vec!["tok_a", "tok_b"],
            notification: FcmNotification {
                title: "Title",
                body: "Body",
            },
            data: &data,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["registration_ids"], json!(["tok_a", "tok_b"]));
        assert_eq!(value["notification"]["title"], "Title");
        assert_eq!(value["data"]["kind"], "reminder");
    }

    #[test]
    fn empty_data_is_omitted_from_request() {
        let data = HashMap::new();
        let request = FcmRequest {
            registration_ids: vec!["tok_a"],
            notification: FcmNotification {
                title: "T",
                body: "B",
            },
            data: &data,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("data").is_none());
    }

    #[test]
    fn response_parses_per_token_results() {
        let json = r#"{
            "success": 2,
            "failure": 1,
            "results": [
                {"message_id": "m1"},
                {"error": "NotRegistered"},
                {"message_id": "m2"}
            ]
        }"#;

        let response: FcmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.success, 2);
        assert_eq!(response.failure, 1);
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[1].error.as_deref(), Some("NotRegistered"));
    }
}
