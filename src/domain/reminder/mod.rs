//! Reminder domain - time-triggered progress reminders and trial-expiry
//! notifications.
//!
//! Batch-driven, not request-driven: a scheduler loop computes the next
//! fixed wall-clock instant in a single configured time zone and fires the
//! matching job.

mod jobs;
mod scheduler;
mod slots;

pub use jobs::{ProgressReminderReport, ReminderJobs, TrialExpiryReport};
pub use scheduler::{next_tick, ReminderScheduler, SchedulerHandle, Tick};
pub use slots::{
    message_for_hour, trial_expiry_message, ReminderSlot, PROGRESS_REMINDER_HOURS,
    TRIAL_CHECK_HOUR,
};
