//! User settings for the focus timer.
//!
//! Stored as camelCase JSON under the `pomodoro_settings` key. Fields missing
//! from a saved document fall back to their defaults, so older or partial
//! documents still load.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_work: bool,
    #[serde(default = "default_true")]
    pub sound_notifications: bool,
    #[serde(default = "default_true")]
    pub desktop_notifications: bool,
    #[serde(default = "default_pomodoros_until_long_break")]
    pub pomodoros_until_long_break: u32,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_pomodoros_until_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            auto_start_breaks: true,
            auto_start_work: false,
            sound_notifications: true,
            desktop_notifications: true,
            pomodoros_until_long_break: default_pomodoros_until_long_break(),
        }
    }
}

/// A partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start_breaks: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start_work: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pomodoros_until_long_break: Option<u32>,
}

impl Settings {
    /// Check that every count is positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("workMinutes", self.work_minutes),
            ("breakMinutes", self.break_minutes),
            ("longBreakMinutes", self.long_break_minutes),
            ("pomodorosUntilLongBreak", self.pomodoros_until_long_break),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: "must be a positive integer".into(),
                });
            }
        }
        Ok(())
    }

    /// Return a copy with `patch` applied, or the first validation failure.
    pub fn merged(&self, patch: &SettingsPatch) -> Result<Settings, ValidationError> {
        let merged = Settings {
            work_minutes: patch.work_minutes.unwrap_or(self.work_minutes),
            break_minutes: patch.break_minutes.unwrap_or(self.break_minutes),
            long_break_minutes: patch.long_break_minutes.unwrap_or(self.long_break_minutes),
            auto_start_breaks: patch.auto_start_breaks.unwrap_or(self.auto_start_breaks),
            auto_start_work: patch.auto_start_work.unwrap_or(self.auto_start_work),
            sound_notifications: patch.sound_notifications.unwrap_or(self.sound_notifications),
            desktop_notifications: patch
                .desktop_notifications
                .unwrap_or(self.desktop_notifications),
            pomodoros_until_long_break: patch
                .pomodoros_until_long_break
                .unwrap_or(self.pomodoros_until_long_break),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Get a setting as a string by its camelCase key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        json.get(key).map(|v| v.to_string())
    }

    /// Build the patch that sets `key` to `value`, parsing `value` by the
    /// field's current type.
    pub fn patch_for(&self, key: &str, value: &str) -> Result<SettingsPatch, ConfigError> {
        let json = serde_json::to_value(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let existing = json
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => value
                .trim()
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as bool"),
                })?,
            serde_json::Value::Number(_) => {
                let minutes = parse_minutes(key, value, 0).map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
                serde_json::Value::Number(minutes.into())
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };

        let mut patch = serde_json::Map::new();
        patch.insert(key.to_string(), new_value);
        serde_json::from_value(serde_json::Value::Object(patch))
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }
}

/// Parse user input as a positive number of minutes.
///
/// On failure the error carries `last_good`, the value the input should be
/// reverted to.
pub fn parse_minutes(field: &str, input: &str, last_good: u32) -> Result<u32, ValidationError> {
    match input.trim().parse::<u32>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(ValidationError::InvalidDuration {
            field: field.to_string(),
            value: input.to_string(),
            last_good,
        }),
    }
}
