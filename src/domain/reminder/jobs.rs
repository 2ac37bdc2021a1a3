//! Reminder jobs.
//!
//! The two batch jobs the scheduler fires: per-slot progress reminders and
//! the daily trial-expiry check. Candidate selection reads the entitlement
//! store; the progress-log reader supplies the per-day deduplication fact.
//!
//! Push failures inside a run are caught and logged; the next scheduled
//! tick is the retry boundary. No run-level dedup token is kept: re-running
//! the same instant can re-notify accounts that still have not logged.

use std::sync::Arc;

use chrono::FixedOffset;

use crate::domain::account::{Account, DeviceToken, ReminderTime};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{AccountRepository, ProgressLogReader, PushSender};

use super::slots::{message_for_hour, trial_expiry_message};

/// Outcome of one progress-reminder run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressReminderReport {
    /// Accounts matching the selection criteria.
    pub candidates: usize,

    /// Candidates excluded because they already logged progress today.
    pub already_logged: usize,

    /// Device tokens in the multicast batch.
    pub tokens_in_batch: usize,

    /// Per-token successes reported by the dispatcher.
    pub delivered: u32,

    /// Per-token failures reported by the dispatcher.
    pub failed: u32,
}

/// Outcome of one trial-expiry run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialExpiryReport {
    /// Trial accounts inside the two-day window.
    pub in_window: usize,

    /// Accounts that received an expiry notice.
    pub notified: usize,

    /// Accounts whose dispatch failed.
    pub failed: usize,
}

/// The scheduler's batch jobs.
pub struct ReminderJobs {
    accounts: Arc<dyn AccountRepository>,
    progress: Arc<dyn ProgressLogReader>,
    push: Arc<dyn PushSender>,
    tz: FixedOffset,
}

impl ReminderJobs {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        progress: Arc<dyn ProgressLogReader>,
        push: Arc<dyn PushSender>,
        tz: FixedOffset,
    ) -> Self {
        Self {
            accounts,
            progress,
            push,
            tz,
        }
    }

    /// Runs the progress reminder for one wall-clock hour.
    ///
    /// Selection: active accounts with notifications enabled, the hour in
    /// their reminder-time set, and at least one device token. Accounts that
    /// already logged progress today (calendar day in the scheduler's time
    /// zone) are excluded, then all remaining tokens go out as one multicast.
    ///
    /// # Errors
    ///
    /// Only candidate-selection failures surface; dispatch failures are
    /// logged and reported in the returned counts.
    pub async fn run_progress_reminder(
        &self,
        hour: u8,
    ) -> Result<ProgressReminderReport, DomainError> {
        let time = ReminderTime::on_the_hour(hour)
            .map_err(|e| DomainError::validation("hour", e.to_string()))?;
        let candidates = self.accounts.find_reminder_candidates(time).await?;
        let today = Timestamp::now().date_in(self.tz);

        let mut report = ProgressReminderReport {
            candidates: candidates.len(),
            ..Default::default()
        };

        let mut tokens: Vec<DeviceToken> = Vec::new();
        for account in &candidates {
            match self.progress.has_entry_on(&account.id, today).await {
                Ok(true) => {
                    report.already_logged += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    // Dedup is best-effort; an unreadable log must not
                    // swallow the reminder.
                    tracing::warn!(
                        account_id = %account.id,
                        error = %e,
                        "progress lookup failed; treating as not logged"
                    );
                }
            }
            tokens.extend(account.notifications.device_tokens.iter().cloned());
        }

        report.tokens_in_batch = tokens.len();
        if tokens.is_empty() {
            tracing::debug!(hour, "no reminder recipients this run");
            return Ok(report);
        }

        let message = message_for_hour(hour);
        match self.push.send_multicast(&message, &tokens).await {
            Ok(outcome) => {
                report.delivered = outcome.success_count;
                report.failed = outcome.failure_count;
                if outcome.failure_count > 0 {
                    tracing::warn!(
                        hour,
                        delivered = outcome.success_count,
                        failed = outcome.failure_count,
                        "partial multicast failure"
                    );
                }
            }
            Err(e) => {
                // Caught here so a provider outage never kills the loop;
                // the next tick is the retry boundary.
                report.failed = tokens.len() as u32;
                tracing::error!(hour, error = %e, "progress reminder dispatch failed");
            }
        }

        tracing::info!(
            hour,
            candidates = report.candidates,
            already_logged = report.already_logged,
            tokens = report.tokens_in_batch,
            delivered = report.delivered,
            failed = report.failed,
            "progress reminder run finished"
        );

        Ok(report)
    }

    /// Runs the daily trial-expiry check.
    ///
    /// Selects trial accounts whose `trial_ends_at` falls within the next
    /// two days and sends an individualized push when the whole-days-left
    /// count is 1 or 2.
    pub async fn run_trial_expiry(&self) -> Result<TrialExpiryReport, DomainError> {
        let now = Timestamp::now();
        let ending = self
            .accounts
            .find_trials_ending_between(now, now.add_days(2))
            .await?;

        let mut report = TrialExpiryReport {
            in_window: ending.len(),
            ..Default::default()
        };

        for account in &ending {
            let Some(days_left) = account.trial_days_left(now) else {
                continue;
            };
            if !(1..=2).contains(&days_left) {
                continue;
            }
            if account.notifications.device_tokens.is_empty() {
                continue;
            }

            match self.notify_trial_expiry(account, days_left).await {
                Ok(()) => report.notified += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        account_id = %account.id,
                        days_left,
                        error = %e,
                        "trial expiry dispatch failed"
                    );
                }
            }
        }

        tracing::info!(
            in_window = report.in_window,
            notified = report.notified,
            failed = report.failed,
            "trial expiry run finished"
        );

        Ok(report)
    }

    async fn notify_trial_expiry(
        &self,
        account: &Account,
        days_left: i64,
    ) -> Result<(), crate::ports::PushError> {
        let message = trial_expiry_message(days_left);
        let outcome = self
            .push
            .send_multicast(&message, &account.notifications.device_tokens)
            .await?;
        if outcome.is_total_failure() {
            return Err(crate::ports::PushError::Unavailable(
                "all tokens failed".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryAccountRepository, InMemoryProgressLog, MockPushSender,
    };
    use crate::domain::foundation::ExternalIdentityId;

    fn tz_utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    struct Fixture {
        jobs: ReminderJobs,
        accounts: Arc<InMemoryAccountRepository>,
        progress: Arc<InMemoryProgressLog>,
        push: Arc<MockPushSender>,
    }

    fn fixture() -> Fixture {
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let progress = Arc::new(InMemoryProgressLog::new());
        let push = Arc::new(MockPushSender::new());
        let jobs = ReminderJobs::new(accounts.clone(), progress.clone(), push.clone(), tz_utc());
        Fixture {
            jobs,
            accounts,
            progress,
            push,
        }
    }

    async fn reminder_account(f: &Fixture, tag: &str, hour: u8, tokens: usize) -> Account {
        let mut account = Account::register(
            ExternalIdentityId::new(format!("idp|{}", tag)).unwrap(),
            format!("{}@example.com", tag),
            None,
            14,
        );
        account.set_reminder_times(vec![ReminderTime::on_the_hour(hour).unwrap()]);
        for i in 0..tokens {
            account.add_device_token(DeviceToken::new(format!("tok_{}_{}", tag, i)).unwrap());
        }
        f.accounts.create(&account).await.unwrap();
        account
    }

    // ══════════════════════════════════════════════════════════════
    // Progress reminders
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn includes_account_that_has_not_logged_today() {
        let f = fixture();
        reminder_account(&f, "amy", 18, 2).await;

        let report = f.jobs.run_progress_reminder(18).await.unwrap();

        assert_eq!(report.candidates, 1);
        assert_eq!(report.already_logged, 0);
        assert_eq!(report.tokens_in_batch, 2);
        assert_eq!(f.push.multicast_calls().len(), 1);
    }

    #[tokio::test]
    async fn excludes_account_that_logged_today() {
        let f = fixture();
        let account = reminder_account(&f, "amy", 18, 1).await;
        f.progress
            .add_entry(account.id, Timestamp::now().date_in(tz_utc()));

        let report = f.jobs.run_progress_reminder(18).await.unwrap();

        assert_eq!(report.candidates, 1);
        assert_eq!(report.already_logged, 1);
        assert_eq!(report.tokens_in_batch, 0);
        assert!(f.push.multicast_calls().is_empty());
    }

    #[tokio::test]
    async fn rerun_after_logging_excludes_the_account() {
        let f = fixture();
        let account = reminder_account(&f, "amy", 18, 1).await;

        let first = f.jobs.run_progress_reminder(18).await.unwrap();
        assert_eq!(first.tokens_in_batch, 1);

        f.progress
            .add_entry(account.id, Timestamp::now().date_in(tz_utc()));

        let second = f.jobs.run_progress_reminder(18).await.unwrap();
        assert_eq!(second.tokens_in_batch, 0);
        assert_eq!(second.already_logged, 1);
    }

    #[tokio::test]
    async fn pools_tokens_from_all_candidates_into_one_multicast() {
        let f = fixture();
        reminder_account(&f, "amy", 22, 2).await;
        reminder_account(&f, "bob", 22, 1).await;
        // Different slot; not selected at 22.
        reminder_account(&f, "cat", 12, 1).await;

        let report = f.jobs.run_progress_reminder(22).await.unwrap();

        assert_eq!(report.candidates, 2);
        assert_eq!(report.tokens_in_batch, 3);
        let calls = f.push.multicast_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.len(), 3);
    }

    #[tokio::test]
    async fn uses_slot_specific_copy() {
        let f = fixture();
        reminder_account(&f, "amy", 23, 1).await;

        f.jobs.run_progress_reminder(23).await.unwrap();

        let calls = f.push.multicast_calls();
        assert!(calls[0].0.title.contains("Last call"));
    }

    #[tokio::test]
    async fn dispatch_failure_is_caught_and_counted() {
        let f = fixture();
        reminder_account(&f, "amy", 18, 2).await;
        f.push.fail_next("provider down");

        let report = f.jobs.run_progress_reminder(18).await.unwrap();

        assert_eq!(report.failed, 2);
        assert_eq!(report.delivered, 0);
    }

    #[tokio::test]
    async fn no_candidates_sends_nothing() {
        let f = fixture();

        let report = f.jobs.run_progress_reminder(12).await.unwrap();

        assert_eq!(report.candidates, 0);
        assert!(f.push.multicast_calls().is_empty());
    }

    // ══════════════════════════════════════════════════════════════
    // Trial expiry
    // ══════════════════════════════════════════════════════════════

    async fn trial_account(f: &Fixture, tag: &str, hours_left: i64, tokens: usize) -> Account {
        let mut account = Account::register(
            ExternalIdentityId::new(format!("idp|{}", tag)).unwrap(),
            format!("{}@example.com", tag),
            None,
            14,
        );
        account.subscription.trial_ends_at = Timestamp::now().add_hours(hours_left);
        for i in 0..tokens {
            account.add_device_token(DeviceToken::new(format!("tok_{}_{}", tag, i)).unwrap());
        }
        f.accounts.create(&account).await.unwrap();
        account
    }

    #[tokio::test]
    async fn trial_ending_in_36_hours_notified_with_two_days() {
        let f = fixture();
        trial_account(&f, "amy", 36, 1).await;

        let report = f.jobs.run_trial_expiry().await.unwrap();

        assert_eq!(report.in_window, 1);
        assert_eq!(report.notified, 1);
        let calls = f.push.multicast_calls();
        assert_eq!(calls[0].0.data.get("days_left"), Some(&"2".to_string()));
        assert!(calls[0].0.title.contains("2 days"));
    }

    #[tokio::test]
    async fn trial_ending_in_20_hours_notified_with_singular_copy() {
        let f = fixture();
        trial_account(&f, "amy", 20, 1).await;

        f.jobs.run_trial_expiry().await.unwrap();

        let calls = f.push.multicast_calls();
        assert_eq!(calls[0].0.data.get("days_left"), Some(&"1".to_string()));
        assert!(calls[0].0.title.contains("tomorrow"));
    }

    #[tokio::test]
    async fn trial_ending_beyond_window_is_not_selected() {
        let f = fixture();
        trial_account(&f, "amy", 30 * 24, 1).await;

        let report = f.jobs.run_trial_expiry().await.unwrap();

        assert_eq!(report.in_window, 0);
        assert!(f.push.multicast_calls().is_empty());
    }

    #[tokio::test]
    async fn tokenless_trial_account_is_skipped() {
        let f = fixture();
        trial_account(&f, "amy", 36, 0).await;

        let report = f.jobs.run_trial_expiry().await.unwrap();

        assert_eq!(report.in_window, 1);
        assert_eq!(report.notified, 0);
    }

    #[tokio::test]
    async fn one_failed_dispatch_does_not_stop_the_run() {
        let f = fixture();
        trial_account(&f, "amy", 36, 1).await;
        trial_account(&f, "bob", 36, 1).await;
        f.push.fail_next("provider down");

        let report = f.jobs.run_trial_expiry().await.unwrap();

        assert_eq!(report.notified, 1);
        assert_eq!(report.failed, 1);
    }
}
