//! Tracing-backed audit log.
//!
//! Emits each audit record as a structured `tracing` event on a dedicated
//! target, which the subscriber ships wherever operational logs go. Durable
//! audit persistence lives outside this crate.

use async_trait::async_trait;

use crate::ports::{AuditLog, AuditOutcome, AuditRecord};

/// Default production audit sink.
#[derive(Default)]
pub struct TracingAuditLog;

impl TracingAuditLog {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, record: AuditRecord) {
        let account_id = record
            .account_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        let before = record.before_status.map(|s| s.as_str()).unwrap_or("-");
        let after = record.after_status.map(|s| s.as_str()).unwrap_or("-");
        let detail = record.detail.as_deref().unwrap_or("");

        match record.outcome {
            AuditOutcome::Success | AuditOutcome::Ignored => {
                tracing::info!(
                    target: "peakform::audit",
                    action = %record.action,
                    account_id = %account_id,
                    before = %before,
                    after = %after,
                    outcome = ?record.outcome,
                    detail = %detail,
                );
            }
            AuditOutcome::Failure | AuditOutcome::Anomaly => {
                tracing::warn!(
                    target: "peakform::audit",
                    action = %record.action,
                    account_id = %account_id,
                    before = %before,
                    after = %after,
                    outcome = ?record.outcome,
                    detail = %detail,
                );
            }
        }
    }
}
