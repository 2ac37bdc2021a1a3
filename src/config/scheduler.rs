//! Reminder scheduler configuration

use chrono::FixedOffset;
use serde::Deserialize;

use super::error::ValidationError;

/// Reminder scheduler configuration
///
/// All scheduled instants are interpreted in a single fixed time zone,
/// expressed as a whole-hour UTC offset.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler runs in this process
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// UTC offset in whole hours for all scheduled instants
    #[serde(default)]
    pub utc_offset_hours: i8,
}

impl SchedulerConfig {
    /// The scheduler time zone as a chrono offset.
    pub fn time_zone(&self) -> FixedOffset {
        FixedOffset::east_opt(i32::from(self.utc_offset_hours) * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }

    /// Validate scheduler configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(ValidationError::InvalidUtcOffset);
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            utc_offset_hours: 0,
        }
    }
}

fn default_enabled() -> bool {
    true
}
