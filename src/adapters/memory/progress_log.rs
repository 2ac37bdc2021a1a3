//! In-memory ProgressLogReader implementation.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{AccountId, DomainError};
use crate::ports::ProgressLogReader;

/// Set-backed progress log.
#[derive(Default)]
pub struct InMemoryProgressLog {
    entries: Mutex<HashSet<(AccountId, NaiveDate)>>,
}

impl InMemoryProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a progress entry for the given day.
    pub fn add_entry(&self, account_id: AccountId, day: NaiveDate) {
        self.entries
            .lock()
            .expect("progress log lock poisoned")
            .insert((account_id, day));
    }
}

#[async_trait]
impl ProgressLogReader for InMemoryProgressLog {
    async fn has_entry_on(
        &self,
        account_id: &AccountId,
        day: NaiveDate,
    ) -> Result<bool, DomainError> {
        Ok(self
            .entries
            .lock()
            .expect("progress log lock poisoned")
            .contains(&(*account_id, day)))
    }
}
