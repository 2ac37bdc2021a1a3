//! Mock PushSender implementation.
//!
//! Records every dispatch and supports failure injection: whole-call
//! failures (provider outage) and per-token rejections (dead tokens).

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::account::DeviceToken;
use crate::ports::{MulticastOutcome, PushError, PushMessage, PushSender};

/// Recording push sender for tests.
#[derive(Default)]
pub struct MockPushSender {
    single_calls: Mutex<Vec<(PushMessage, DeviceToken)>>,
    multicast_calls: Mutex<Vec<(PushMessage, Vec<DeviceToken>)>>,
    fail_next: Mutex<Option<String>>,
    rejected_tokens: Mutex<HashSet<String>>,
}

impl MockPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next dispatch fail wholesale with the given reason.
    pub fn fail_next(&self, reason: &str) {
        *self.fail_next.lock().expect("mock lock poisoned") = Some(reason.to_string());
    }

    /// Marks a token as permanently rejected by the provider.
    pub fn reject_token(&self, token: &str) {
        self.rejected_tokens
            .lock()
            .expect("mock lock poisoned")
            .insert(token.to_string());
    }

    /// Recorded single sends.
    pub fn single_calls(&self) -> Vec<(PushMessage, DeviceToken)> {
        self.single_calls.lock().expect("mock lock poisoned").clone()
    }

    /// Recorded multicast sends.
    pub fn multicast_calls(&self) -> Vec<(PushMessage, Vec<DeviceToken>)> {
        self.multicast_calls.lock().expect("mock lock poisoned").clone()
    }

    fn take_failure(&self) -> Option<String> {
        self.fail_next.lock().expect("mock lock poisoned").take()
    }
}

#[async_trait]
impl PushSender for MockPushSender {
    async fn send(&self, message: &PushMessage, token: &DeviceToken) -> Result<(), PushError> {
        if let Some(reason) = self.take_failure() {
            return Err(PushError::Unavailable(reason));
        }
        if self
            .rejected_tokens
            .lock()
            .expect("mock lock poisoned")
            .contains(token.as_str())
        {
            return Err(PushError::Rejected("token not registered".to_string()));
        }
        self.single_calls
            .lock()
            .expect("mock lock poisoned")
            .push((message.clone(), token.clone()));
        Ok(())
    }

    async fn send_multicast(
        &self,
        message: &PushMessage,
        tokens: &[DeviceToken],
    ) -> Result<MulticastOutcome, PushError> {
        if let Some(reason) = self.take_failure() {
            return Err(PushError::Unavailable(reason));
        }

        let rejected = self.rejected_tokens.lock().expect("mock lock poisoned");
        let mut outcome = MulticastOutcome::default();
        for token in tokens {
            if rejected.contains(token.as_str()) {
                outcome.failure_count += 1;
                outcome.failed_tokens.push(token.clone());
            } else {
                outcome.success_count += 1;
            }
        }
        drop(rejected);

        self.multicast_calls
            .lock()
            .expect("mock lock poisoned")
            .push((message.clone(), tokens.to_vec()));

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> DeviceToken {
        DeviceToken::new(s).unwrap()
    }

    #[tokio::test]
    async fn multicast_reports_per_token_outcomes() {
        let sender = MockPushSender::new();
        sender.reject_token("dead");

        let outcome = sender
            .send_multicast(
                &PushMessage::new("t", "b"),
                &[token("live1"), token("dead"), token("live2")],
            )
            .await
            .unwrap();

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.failure_count, 1);
        assert_eq!(outcome.failed_tokens.len(), 1);
        assert!(!outcome.is_total_failure());
    }

    #[tokio::test]
    async fn fail_next_applies_once() {
        let sender = MockPushSender::new();
        sender.fail_next("outage");

        let first = sender
            .send_multicast(&PushMessage::new("t", "b"), &[token("tok")])
            .await;
        assert!(first.is_err());

        let second = sender
            .send_multicast(&PushMessage::new("t", "b"), &[token("tok")])
            .await;
        assert!(second.is_ok());
    }
}
