//! Reminder slots and notification copy.
//!
//! Four fixed daily progress-reminder instants, each with its own canned
//! title/body pair, plus the daily trial-expiry check.

use crate::ports::PushMessage;

/// Hours (local to the scheduler time zone) at which progress reminders run.
pub const PROGRESS_REMINDER_HOURS: [u8; 4] = [12, 18, 22, 23];

/// Hour of the daily trial-expiry check.
pub const TRIAL_CHECK_HOUR: u8 = 10;

/// A named progress-reminder instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderSlot {
    /// 12:00 - midday check-in.
    Midday,
    /// 18:00 - after-work nudge.
    Evening,
    /// 22:00 - late reminder.
    Night,
    /// 23:00 - last call before the day rolls over.
    LastCall,
}

impl ReminderSlot {
    /// Slot for a wall-clock hour, if one is defined.
    pub fn for_hour(hour: u8) -> Option<Self> {
        match hour {
            12 => Some(ReminderSlot::Midday),
            18 => Some(ReminderSlot::Evening),
            22 => Some(ReminderSlot::Night),
            23 => Some(ReminderSlot::LastCall),
            _ => None,
        }
    }

    pub fn hour(&self) -> u8 {
        match self {
            ReminderSlot::Midday => 12,
            ReminderSlot::Evening => 18,
            ReminderSlot::Night => 22,
            ReminderSlot::LastCall => 23,
        }
    }

    /// Canned copy for this slot.
    pub fn message(&self) -> PushMessage {
        match self {
            ReminderSlot::Midday => PushMessage::new(
                "Midday check-in 💪",
                "Half the day is gone - snap a progress photo while you're at it!",
            ),
            ReminderSlot::Evening => PushMessage::new(
                "How did today's workout go?",
                "Log your progress photo before dinner and keep the streak alive.",
            ),
            ReminderSlot::Night => PushMessage::new(
                "Don't break the streak",
                "A quick photo is all it takes to log today's progress.",
            ),
            ReminderSlot::LastCall => PushMessage::new(
                "Last call for today ⏰",
                "The day resets at midnight - log your progress now!",
            ),
        }
    }
}

/// Copy for an instant with no dedicated slot.
fn default_message() -> PushMessage {
    PushMessage::new(
        "Time to log your progress",
        "Open Peakform and record how today went.",
    )
}

/// Message for a given wall-clock hour: slot-specific, or the default pair
/// for any other instant.
pub fn message_for_hour(hour: u8) -> PushMessage {
    ReminderSlot::for_hour(hour)
        .map(|slot| slot.message())
        .unwrap_or_else(default_message)
}

/// Individualized trial-expiry copy. Singular wording at exactly one day.
pub fn trial_expiry_message(days_left: i64) -> PushMessage {
    let (title, body) = if days_left == 1 {
        (
            "Your trial ends tomorrow".to_string(),
            "Keep your progress going - pick a plan before your trial runs out.".to_string(),
        )
    } else {
        (
            format!("Your trial ends in {} days", days_left),
            "Keep your progress going - pick a plan before your trial runs out.".to_string(),
        )
    };
    PushMessage::new(title, body)
        .with_data("kind", "trial_expiry")
        .with_data("days_left", days_left.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_fixed_hour_has_a_slot() {
        for hour in PROGRESS_REMINDER_HOURS {
            let slot = ReminderSlot::for_hour(hour).unwrap();
            assert_eq!(slot.hour(), hour);
        }
    }

    #[test]
    fn off_slot_hours_have_no_slot() {
        assert!(ReminderSlot::for_hour(9).is_none());
        assert!(ReminderSlot::for_hour(0).is_none());
    }

    #[test]
    fn slot_messages_are_distinct() {
        let messages: Vec<_> = [
            ReminderSlot::Midday,
            ReminderSlot::Evening,
            ReminderSlot::Night,
            ReminderSlot::LastCall,
        ]
        .iter()
        .map(|s| s.message().title)
        .collect();

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unknown_hour_falls_back_to_default_copy() {
        let msg = message_for_hour(9);
        assert_eq!(msg.title, "Time to log your progress");
    }

    #[test]
    fn trial_copy_is_singular_at_one_day() {
        let msg = trial_expiry_message(1);
        assert!(msg.title.contains("tomorrow"));
        assert!(!msg.title.contains("1 days"));
    }

    #[test]
    fn trial_copy_is_plural_at_two_days() {
        let msg = trial_expiry_message(2);
        assert!(msg.title.contains("2 days"));
    }

    #[test]
    fn trial_copy_carries_data_payload() {
        let msg = trial_expiry_message(2);
        assert_eq!(msg.data.get("kind"), Some(&"trial_expiry".to_string()));
        assert_eq!(msg.data.get("days_left"), Some(&"2".to_string()));
    }
}
