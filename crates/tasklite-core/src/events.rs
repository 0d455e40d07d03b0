use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerState};

/// Every state change in the engine produces an Event.
/// Views render `StateSnapshot`; the other variants describe what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        phase: Phase,
        completed_work_sessions: u32,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// The next phase will start by itself after `delay_ms`.
    AutoStartScheduled {
        phase: Phase,
        delay_ms: u64,
        at: DateTime<Utc>,
    },
    /// Reconciliation snapped the countdown to the wall-clock value.
    /// `drift_secs` is countdown minus expected before the correction.
    TimerSynced {
        drift_secs: i64,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// A running session was picked up from durable storage on start-up.
    SessionRestored {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    WorkDurationChanged {
        minutes: u32,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        phase: Phase,
        phase_label: String,
        remaining_secs: u32,
        total_secs: u32,
        /// `MM:SS`
        display: String,
        /// 0.0 ..= 1.0 within the current phase.
        progress: f64,
        completed_work_sessions: u32,
        at: DateTime<Utc>,
    },
}

/// Format seconds as zero-padded `MM:SS`.
pub fn format_countdown(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
