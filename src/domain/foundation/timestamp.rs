//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by adding the specified number of hours.
    pub fn add_hours(&self, hours: i64) -> Self {
        Self(self.0 + Duration::hours(hours))
    }

    /// Creates a new timestamp by adding calendar months.
    ///
    /// Calendar arithmetic, not a fixed-day approximation: Jan 10 plus one
    /// month is Feb 10. Day-of-month is clamped when the target month is
    /// shorter (Jan 31 plus one month is Feb 28/29).
    pub fn add_calendar_months(&self, months: u32) -> Self {
        match self.0.checked_add_months(Months::new(months)) {
            Some(dt) => Self(dt),
            None => Self::far_future(),
        }
    }

    /// Sentinel used for entitlements that never expire.
    pub fn far_future() -> Self {
        Self(
            Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
                .single()
                .unwrap_or_else(Utc::now),
        )
    }

    /// Creates a timestamp from Unix seconds.
    pub fn from_unix_secs(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now))
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns the calendar date of this instant in the given fixed offset.
    pub fn date_in(&self, offset: FixedOffset) -> NaiveDate {
        self.0.with_timezone(&offset).date_naive()
    }

    /// Whole days remaining until `deadline`, rounded up.
    ///
    /// 36 hours remaining counts as 2 days, 20 hours as 1. Returns 0 when the
    /// deadline has passed.
    pub fn days_until_ceil(&self, deadline: &Timestamp) -> i64 {
        let secs = deadline.0.signed_duration_since(self.0).num_seconds();
        if secs <= 0 {
            return 0;
        }
        (secs + 86_399) / 86_400
    }

    /// Year component in UTC.
    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
