//! Progress log reader port.
//!
//! The reminder scheduler only needs one derived fact from the progress-log
//! subsystem: whether an account has logged anything on a given calendar
//! day. The day is computed by the caller in the scheduler's time zone.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{AccountId, DomainError};

/// Read-only port over per-account progress entries.
#[async_trait]
pub trait ProgressLogReader: Send + Sync {
    /// Whether the account has at least one progress entry dated `day`.
    async fn has_entry_on(&self, account_id: &AccountId, day: NaiveDate)
        -> Result<bool, DomainError>;
}
