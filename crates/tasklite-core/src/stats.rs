//! Aggregate focus statistics.
//!
//! Only completed work sessions count; breaks never touch these numbers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    #[serde(default)]
    pub completed_count: u64,
    #[serde(default)]
    pub total_focus_minutes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub total_completed_work_sessions: u64,
    /// Keyed by local calendar day, `YYYY-MM-DD`.
    #[serde(default)]
    pub per_day_stats: BTreeMap<String, DayStats>,
}

impl Statistics {
    /// Count one completed work session of `focus_minutes` on `day`.
    pub fn record_work_session(&mut self, day: &str, focus_minutes: u32) {
        let entry = self.per_day_stats.entry(day.to_string()).or_default();
        entry.completed_count += 1;
        entry.total_focus_minutes += u64::from(focus_minutes);
        self.total_completed_work_sessions += 1;
    }

    pub fn day(&self, day: &str) -> DayStats {
        self.per_day_stats.get(day).copied().unwrap_or_default()
    }

    pub fn total_focus_minutes(&self) -> u64 {
        self.per_day_stats.values().map(|d| d.total_focus_minutes).sum()
    }
}
