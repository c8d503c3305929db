//! Engine configuration.
//!
//! Every field has a default matching the clinic's standing rules, so a
//! partial JSON document only needs the values it overrides.

use crate::attendance::Priority;
use crate::finalization::DEFAULT_KEY_PREFIX;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid range for {field}: {min} > {max}")]
    InvalidRange { field: &'static str, min: u32, max: u32 },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Limits and constants for session recurrence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceConfig {
    pub min_return_weeks: u32,
    pub max_return_weeks: u32,
    pub max_quantity: u32,
    pub min_duration: u8,
    pub max_duration: u8,
    /// Minutes per light-bath duration unit.
    pub duration_unit_minutes: u32,
    /// Days between consecutive sessions.
    pub interval_days: u32,
    pub session_time: NaiveTime,
}

impl RecurrenceConfig {
    /// Length of a light-bath session of `units` duration units.
    pub fn duration_minutes(&self, units: u8) -> u32 {
        u32::from(units) * self.duration_unit_minutes
    }
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            min_return_weeks: 1,
            max_return_weeks: 52,
            max_quantity: 20,
            min_duration: 1,
            max_duration: 5,
            duration_unit_minutes: 7,
            interval_days: 7,
            session_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalizationConfig {
    pub key_prefix: String,
    /// Note attached to every unjustified absence.
    pub unjustified_note: String,
}

impl Default for FinalizationConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            unjustified_note: "Falta não justificada".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckInConfig {
    pub default_priority: Priority,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    pub recurrence: RecurrenceConfig,
    pub finalization: FinalizationConfig,
    pub check_in: CheckInConfig,
}

impl ClinicConfig {
    /// Parse a JSON document over the defaults and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ClinicConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.recurrence;
        if r.min_return_weeks > r.max_return_weeks {
            return Err(ConfigError::InvalidRange {
                field: "return_weeks",
                min: r.min_return_weeks,
                max: r.max_return_weeks,
            });
        }
        if r.min_duration > r.max_duration {
            return Err(ConfigError::InvalidRange {
                field: "duration",
                min: u32::from(r.min_duration),
                max: u32::from(r.max_duration),
            });
        }
        if r.max_quantity == 0 {
            return Err(ConfigError::Zero {
                field: "max_quantity",
            });
        }
        if r.interval_days == 0 {
            return Err(ConfigError::Zero {
                field: "interval_days",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_clinic_rules() {
        let config = ClinicConfig::default();
        assert_eq!(config.recurrence.max_return_weeks, 52);
        assert_eq!(config.recurrence.max_quantity, 20);
        assert_eq!(config.recurrence.session_time.to_string(), "08:00:00");
        assert_eq!(config.finalization.key_prefix, "day-finalized-");
        assert_eq!(config.check_in.default_priority, Priority::Standard);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let config = ClinicConfig::from_json_str(
            r#"{"recurrence": {"max_quantity": 10}, "check_in": {"default_priority": "2"}}"#,
        )
        .unwrap();

        assert_eq!(config.recurrence.max_quantity, 10);
        assert_eq!(config.recurrence.max_return_weeks, 52);
        assert_eq!(config.check_in.default_priority, Priority::Elderly);
    }

    #[test]
    fn light_bath_minutes_follow_the_unit() {
        let config = ClinicConfig::from_json_str(r#"{"recurrence": {"duration_unit_minutes": 10}}"#)
            .unwrap();

        assert_eq!(config.recurrence.duration_minutes(3), 30);
        assert_eq!(RecurrenceConfig::default().duration_minutes(5), 35);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let result = ClinicConfig::from_json_str(
            r#"{"recurrence": {"min_return_weeks": 10, "max_return_weeks": 2}}"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidRange { .. })));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ClinicConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
