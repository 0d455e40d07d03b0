//! Operator configuration in `config.toml`.
//!
//! Operator tunables that are not user preferences:
//! - Timer cadence (tick, reconciliation, drift tolerance, auto-start delay)
//! - Database location override
//! - Notification application name
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Timer cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,
    /// Drift up to this many seconds is left uncorrected.
    #[serde(default = "default_drift_tolerance_secs")]
    pub drift_tolerance_secs: u32,
    #[serde(default = "default_auto_start_delay_ms")]
    pub auto_start_delay_ms: u64,
}

/// Where the durable store lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Use this database file instead of `<data_dir>/tasklite.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Text used in desktop notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_reconcile_interval_secs() -> u64 {
    5
}
fn default_drift_tolerance_secs() -> u32 {
    2
}
fn default_auto_start_delay_ms() -> u64 {
    1000
}
fn default_app_name() -> String {
    "TaskLite".into()
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            reconcile_interval_secs: default_reconcile_interval_secs(),
            drift_tolerance_secs: default_drift_tolerance_secs(),
            auto_start_delay_ms: default_auto_start_delay_ms(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs.max(1))
    }

    pub fn auto_start_delay(&self) -> Duration {
        Duration::from_millis(self.auto_start_delay_ms)
    }
}

impl Config {
    /// Walk a dotted key (`timing.tick_interval_ms`) through the JSON form.
    fn lookup<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.').try_fold(root, |node, part| node.get(part))
    }

    /// Replace the leaf at a dotted key, parsing `value` as the type already
    /// stored there.
    fn assign(root: &mut serde_json::Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |expected: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{value}' as {expected}"),
        };

        let (parent, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Self::lookup_mut(root, parent), leaf),
            None => (Some(root), key),
        };
        let slot = parent
            .and_then(serde_json::Value::as_object_mut)
            .and_then(|table| table.get_mut(leaf))
            .ok_or_else(unknown)?;

        *slot = match slot {
            serde_json::Value::Bool(_) => {
                serde_json::Value::Bool(value.parse().map_err(|_| invalid("bool"))?)
            }
            serde_json::Value::Number(_) => {
                serde_json::Value::from(value.parse::<u64>().map_err(|_| invalid("number"))?)
            }
            // Unset optional fields serialize as null; empty input keeps them unset.
            serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
            serde_json::Value::Object(_) => return Err(unknown()),
            _ => serde_json::Value::String(value.to_string()),
        };
        Ok(())
    }

    fn lookup_mut<'a>(
        root: &'a mut serde_json::Value,
        key: &str,
    ) -> Option<&'a mut serde_json::Value> {
        key.split('.').try_fold(root, |node, part| node.get_mut(part))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from `<data_dir>/config.toml`, writing defaults if it is missing.
    ///
    /// Fails when an existing file does not parse or the defaults cannot
    /// be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let defaults = Self::default();
                defaults.save_to(path)?;
                Ok(defaults)
            }
        }
    }

    /// Persist to `<data_dir>/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Value at a dotted key, strings unquoted.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        Self::lookup(&json, key).map(|value| match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not parse as the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::assign(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.timing.reconcile_interval_secs, 5);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.timing.tick_interval_ms, 1000);
        assert_eq!(parsed.timing.drift_tolerance_secs, 2);
        assert_eq!(parsed.notifications.app_name, "TaskLite");
        assert!(parsed.storage.database_path.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timing.auto_start_delay_ms").as_deref(), Some("1000"));
        assert_eq!(cfg.get("notifications.app_name").as_deref(), Some("TaskLite"));
        assert!(cfg.get("timing.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("timing.reconcile_interval_secs", "10").unwrap();
        assert_eq!(cfg.timing.reconcile_interval(), Duration::from_secs(10));
    }

    #[test]
    fn set_updates_optional_path() {
        let mut cfg = Config::default();
        cfg.set("storage.database_path", "/tmp/t.db").unwrap();
        assert_eq!(cfg.storage.database_path, Some(PathBuf::from("/tmp/t.db")));
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timing.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("timing.tick_interval_ms", "fast").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("timing.drift_tolerance_secs", "3").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().timing.drift_tolerance_secs, 3);
    }
}
