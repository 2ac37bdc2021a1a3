//! Account policy configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Account policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Trial length for newly registered accounts, in days
    #[serde(default = "default_trial_days")]
    pub trial_days: i64,
}

impl AccountConfig {
    /// Validate account policy configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=90).contains(&self.trial_days) {
            return Err(ValidationError::InvalidTrialDays);
        }
        Ok(())
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
        }
    }
}

fn default_trial_days() -> i64 {
    14
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_trial_is_two_weeks() {
        let c = AccountConfig::default();
        assert_eq!(c.trial_days, 14);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_day_trial_rejected() {
        let c = AccountConfig { trial_days: 0 };
        assert!(c.validate().is_err());
    }
}
