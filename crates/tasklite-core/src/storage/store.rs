//! Typed durable records over a [`KeyValue`] backend.
//!
//! Three independent JSON documents: settings, statistics and the active
//! timer session. Failures stop here: a read that cannot be completed or
//! decoded is reported as "not found", and a write that fails is logged and
//! dropped, leaving the caller to carry on without persistence.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::KeyValue;
use crate::error::StoreError;
use crate::settings::Settings;
use crate::stats::Statistics;
use crate::timer::Phase;

pub const SETTINGS_KEY: &str = "pomodoro_settings";
pub const STATS_KEY: &str = "pomodoro_stats";
pub const SESSION_KEY: &str = "pomodoro_session";

/// Durable snapshot of a running countdown.
///
/// Present in storage exactly while a timer is running. Timestamps are
/// milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub start_timestamp: i64,
    pub initial_remaining_seconds: u32,
    pub phase: Phase,
    pub completed_work_sessions: u32,
    /// Time of the most recent tick. Diagnostic only.
    #[serde(default)]
    pub last_update_timestamp: i64,
    #[serde(default)]
    pub active: bool,
}

impl SessionRecord {
    /// Countdown value implied by the wall clock at `now_ms`. May be zero or
    /// negative when the phase ran out while nobody was watching.
    pub fn expected_remaining(&self, now_ms: i64) -> i64 {
        let elapsed_secs = (now_ms - self.start_timestamp).div_euclid(1000);
        i64::from(self.initial_remaining_seconds) - elapsed_secs
    }
}

pub struct DurableStore {
    backend: Box<dyn KeyValue>,
}

impl DurableStore {
    pub fn new(backend: impl KeyValue + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn get_settings(&self) -> Option<Settings> {
        self.read(SETTINGS_KEY)
    }

    pub fn set_settings(&self, settings: &Settings) {
        self.write(SETTINGS_KEY, settings);
    }

    pub fn get_stats(&self) -> Option<Statistics> {
        self.read(STATS_KEY)
    }

    pub fn set_stats(&self, stats: &Statistics) {
        self.write(STATS_KEY, stats);
    }

    pub fn get_session_record(&self) -> Option<SessionRecord> {
        self.read(SESSION_KEY)
    }

    pub fn set_session_record(&self, record: &SessionRecord) {
        self.write(SESSION_KEY, record);
    }

    pub fn clear_session_record(&self) {
        if let Err(e) = self.backend.remove(SESSION_KEY) {
            tracing::warn!(key = SESSION_KEY, error = %e, "failed to clear record");
        }
    }

    /// Read and decode `key`, surfacing the failure instead of absorbing it.
    pub fn try_read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    /// Encode and write `value` under `key`, surfacing the failure.
    pub fn try_write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, &raw)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_read(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "treating unreadable record as absent");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_write(key, value) {
            tracing::warn!(key, error = %e, "record not persisted");
        }
    }
}
