//! Reminder scheduler loop.
//!
//! Computes the next fixed wall-clock instant in the configured time zone
//! and sleeps until it, then runs the matching job to completion before
//! computing the next instant. Sleeping to an absolute instant avoids the
//! drift a fixed-interval sleep accumulates, and running inline keeps
//! identical ticks from overlapping.
//!
//! The scheduler is process-wide state with an explicit start/stop
//! lifecycle: composed once at startup, stopped through the returned
//! handle on shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::jobs::ReminderJobs;
use super::slots::{PROGRESS_REMINDER_HOURS, TRIAL_CHECK_HOUR};

/// What a scheduler tick runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Progress reminder for the given wall-clock hour.
    Progress(u8),
    /// Daily trial-expiry check.
    TrialExpiry,
}

/// Computes the next firing instant strictly after `now`.
///
/// Candidate instants are the four progress-reminder hours plus the
/// trial-expiry hour, each at minute zero of the scheduler's time zone,
/// today or tomorrow.
pub fn next_tick(now: DateTime<Utc>, tz: FixedOffset) -> (DateTime<Utc>, Tick) {
    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();

    let mut instants: Vec<(u8, Tick)> = PROGRESS_REMINDER_HOURS
        .iter()
        .map(|&h| (h, Tick::Progress(h)))
        .collect();
    instants.push((TRIAL_CHECK_HOUR, Tick::TrialExpiry));
    instants.sort_by_key(|(h, _)| *h);

    for day_offset in 0..=1 {
        let date = today + chrono::Duration::days(day_offset);
        for &(hour, tick) in &instants {
            let candidate = date.and_hms_opt(hour as u32, 0, 0).and_then(|naive| {
                tz.from_local_datetime(&naive).single()
            });
            if let Some(candidate) = candidate {
                if candidate > local_now {
                    return (candidate.with_timezone(&Utc), tick);
                }
            }
        }
    }

    // Unreachable with a sane fixed offset: tomorrow always has instants
    // after now. Fall back to an hour from now rather than panicking.
    (now + chrono::Duration::hours(1), Tick::TrialExpiry)
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals shutdown and waits for the loop to exit. A tick already in
    /// flight completes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.join.await;
    }
}

/// The time-triggered reminder scheduler.
pub struct ReminderScheduler {
    jobs: Arc<ReminderJobs>,
    tz: FixedOffset,
}

impl ReminderScheduler {
    pub fn new(jobs: Arc<ReminderJobs>, tz: FixedOffset) -> Self {
        Self { jobs, tz }
    }

    /// Spawns the scheduler loop and returns its lifecycle handle.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            tracing::info!(tz = %self.tz, "reminder scheduler started");
            loop {
                let (fire_at, tick) = next_tick(Utc::now(), self.tz);
                let wait = (fire_at - Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                tracing::debug!(?tick, fire_at = %fire_at, "sleeping until next tick");

                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("reminder scheduler stopping");
                            return;
                        }
                    }
                    _ = tokio::time::sleep(wait) => {
                        self.run_tick(tick).await;
                    }
                }
            }
        });

        SchedulerHandle {
            shutdown: shutdown_tx,
            join,
        }
    }

    /// Runs one tick, containing any failure to this run.
    pub async fn run_tick(&self, tick: Tick) {
        let result = match tick {
            Tick::Progress(hour) => self
                .jobs
                .run_progress_reminder(hour)
                .await
                .map(|_| ())
                .map_err(|e| (format!("progress reminder {:02}:00", hour), e)),
            Tick::TrialExpiry => self
                .jobs
                .run_trial_expiry()
                .await
                .map(|_| ())
                .map_err(|e| ("trial expiry".to_string(), e)),
        };

        if let Err((job, e)) = result {
            // One failed run never prevents subsequent scheduled runs.
            tracing::error!(job = %job, error = %e, "scheduled job failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryAccountRepository, InMemoryProgressLog, MockPushSender,
    };

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().unwrap()
    }

    fn tz(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    // ══════════════════════════════════════════════════════════════
    // next_tick
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn morning_fires_trial_check_first() {
        let (at, tick) = next_tick(utc(2025, 6, 1, 8, 30), tz(0));
        assert_eq!(tick, Tick::TrialExpiry);
        assert_eq!(at, utc(2025, 6, 1, 10, 0));
    }

    #[test]
    fn late_morning_fires_noon_reminder() {
        let (at, tick) = next_tick(utc(2025, 6, 1, 10, 30), tz(0));
        assert_eq!(tick, Tick::Progress(12));
        assert_eq!(at, utc(2025, 6, 1, 12, 0));
    }

    #[test]
    fn afternoon_fires_evening_reminder() {
        let (at, tick) = next_tick(utc(2025, 6, 1, 14, 0), tz(0));
        assert_eq!(tick, Tick::Progress(18));
        assert_eq!(at, utc(2025, 6, 1, 18, 0));
    }

    #[test]
    fn between_night_slots_fires_last_call() {
        let (at, tick) = next_tick(utc(2025, 6, 1, 22, 30), tz(0));
        assert_eq!(tick, Tick::Progress(23));
        assert_eq!(at, utc(2025, 6, 1, 23, 0));
    }

    #[test]
    fn after_last_call_rolls_over_to_tomorrow_trial_check() {
        let (at, tick) = next_tick(utc(2025, 6, 1, 23, 30), tz(0));
        assert_eq!(tick, Tick::TrialExpiry);
        assert_eq!(at, utc(2025, 6, 2, 10, 0));
    }

    #[test]
    fn exact_slot_instant_advances_to_next_slot() {
        // Firing exactly at 12:00 must not re-select 12:00.
        let (at, tick) = next_tick(utc(2025, 6, 1, 12, 0), tz(0));
        assert_eq!(tick, Tick::Progress(18));
        assert_eq!(at, utc(2025, 6, 1, 18, 0));
    }

    #[test]
    fn instants_are_interpreted_in_the_scheduler_time_zone() {
        // 04:00 UTC is 13:00 at UTC+9; the next slot there is 18:00 local,
        // which is 09:00 UTC.
        let (at, tick) = next_tick(utc(2025, 6, 1, 4, 0), tz(9));
        assert_eq!(tick, Tick::Progress(18));
        assert_eq!(at, utc(2025, 6, 1, 9, 0));
    }

    #[test]
    fn next_tick_is_always_strictly_in_the_future() {
        let mut now = utc(2025, 6, 1, 0, 0);
        for _ in 0..48 {
            let (at, _) = next_tick(now, tz(9));
            assert!(at > now);
            now = now + chrono::Duration::minutes(30);
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Lifecycle
    // ══════════════════════════════════════════════════════════════

    fn test_scheduler() -> ReminderScheduler {
        let jobs = Arc::new(ReminderJobs::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(InMemoryProgressLog::new()),
            Arc::new(MockPushSender::new()),
            tz(0),
        ));
        ReminderScheduler::new(jobs, tz(0))
    }

    #[tokio::test]
    async fn scheduler_stops_on_shutdown_signal() {
        let handle = test_scheduler().start();

        // Must resolve promptly rather than waiting for the next slot.
        tokio::time::timeout(std::time::Duration::from_secs(1), handle.stop())
            .await
            .expect("scheduler did not stop in time");
    }

    #[tokio::test]
    async fn run_tick_swallows_job_errors() {
        // Empty repos cannot fail here, but the call must complete without
        // panicking for both tick kinds.
        let scheduler = test_scheduler();
        scheduler.run_tick(Tick::Progress(18)).await;
        scheduler.run_tick(Tick::TrialExpiry).await;
    }
}
