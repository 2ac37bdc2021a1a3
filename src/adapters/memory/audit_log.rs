//! In-memory AuditLog implementation.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{AuditLog, AuditRecord};

/// Vec-backed audit sink for tests and local runs.
#[derive(Default)]
pub struct InMemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().expect("audit lock poisoned").clone()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, record: AuditRecord) {
        self.records.lock().expect("audit lock poisoned").push(record);
    }
}
