use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// A countdown segment with its own nominal duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Work,
    Break,
    LongBreak,
}

impl Phase {
    /// Configured length of this phase in minutes.
    pub fn duration_min(self, settings: &Settings) -> u32 {
        match self {
            Phase::Work => settings.work_minutes,
            Phase::Break => settings.break_minutes,
            Phase::LongBreak => settings.long_break_minutes,
        }
    }

    /// Configured length of this phase in seconds.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn duration_secs(self, settings: &Settings) -> u32 {
        self.duration_min(settings).saturating_mul(60)
    }

    /// Whether the auto-start flag for entering this phase is set.
    pub fn auto_starts(self, settings: &Settings) -> bool {
        match self {
            Phase::Work => settings.auto_start_work,
            Phase::Break | Phase::LongBreak => settings.auto_start_breaks,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Focus Session",
            Phase::Break => "Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase that follows `current`.
///
/// `completed_work_sessions` must already include the work session that just
/// finished. A work phase leads to a long break on every `cycle_length`-th
/// completion and to a short break otherwise; any break leads back to work.
/// A zero cycle length is treated as 1.
pub fn next_phase(current: Phase, completed_work_sessions: u32, cycle_length: u32) -> Phase {
    match current {
        Phase::Work => {
            if completed_work_sessions % cycle_length.max(1) == 0 {
                Phase::LongBreak
            } else {
                Phase::Break
            }
        }
        Phase::Break | Phase::LongBreak => Phase::Work,
    }
}
