//! Reminder time preference value object.
//!
//! Accounts store the times of day they want progress reminders as `HH:MM`
//! strings in 24-hour form. The scheduler only fires on whole hours, but the
//! stored preference keeps minutes for forward compatibility.

use crate::domain::foundation::ValidationError;
use serde::{Deserialize, Serialize};

/// A validated time-of-day preference in 24-hour `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderTime {
    hour: u8,
    minute: u8,
}

impl ReminderTime {
    /// Creates a ReminderTime from hour and minute components.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::out_of_range(
                "reminder_time_hour",
                0,
                23,
                hour as i64,
            ));
        }
        if minute > 59 {
            return Err(ValidationError::out_of_range(
                "reminder_time_minute",
                0,
                59,
                minute as i64,
            ));
        }
        Ok(Self { hour, minute })
    }

    /// Convenience constructor for whole-hour preferences.
    pub fn on_the_hour(hour: u8) -> Result<Self, ValidationError> {
        Self::new(hour, 0)
    }

    /// Parses an `HH:MM` string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let (h, m) = s.split_once(':').ok_or_else(|| {
            ValidationError::invalid_format("reminder_time", format!("expected HH:MM, got '{}'", s))
        })?;
        if h.len() != 2 || m.len() != 2 {
            return Err(ValidationError::invalid_format(
                "reminder_time",
                format!("expected zero-padded HH:MM, got '{}'", s),
            ));
        }
        let hour: u8 = h.parse().map_err(|_| {
            ValidationError::invalid_format("reminder_time", "hour is not a number")
        })?;
        let minute: u8 = m.parse().map_err(|_| {
            ValidationError::invalid_format("reminder_time", "minute is not a number")
        })?;
        Self::new(hour, minute)
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl std::fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for ReminderTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReminderTime> for String {
    fn from(t: ReminderTime) -> Self {
        t.to_string()
    }
}
