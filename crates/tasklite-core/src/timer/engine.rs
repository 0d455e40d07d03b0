//! Timer engine implementation.
//!
//! The engine is a wall-clock-anchored state machine. It owns no threads or
//! timers: the caller delivers one `tick()` per second while it is running
//! (see [`crate::service`]) and calls `reconcile()` whenever the countdown may
//! have drifted from the wall clock.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running
//!           |
//!           +-- countdown hits 0 --> Idle (next phase loaded, maybe auto-start)
//! reset(): any -> Idle
//! ```
//!
//! While running, a [`SessionRecord`] in durable storage anchors the countdown
//! to the time the run began. That record is what survives a restart and what
//! reconciliation measures drift against.
//!
//! Every transition that stops the countdown bumps a generation counter.
//! Scheduled callbacks carry the generation they were armed for, and the
//! engine drops any that arrive for an older one.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::{day_key, Clock};
use super::phase::{next_phase, Phase};
use crate::error::ValidationError;
use crate::events::{format_countdown, Event};
use crate::notify::Notifier;
use crate::settings::{Settings, SettingsPatch};
use crate::stats::Statistics;
use crate::storage::{DurableStore, SessionRecord, TimingConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// An auto-start waiting for its delay to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStart {
    pub generation: u64,
    pub delay: Duration,
}

/// Core timer engine.
pub struct TimerEngine {
    settings: Settings,
    stats: Statistics,
    store: DurableStore,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn Notifier>,
    timing: TimingConfig,
    state: TimerState,
    phase: Phase,
    remaining_secs: u32,
    completed_work_sessions: u32,
    /// In-memory copy of the persisted record while running.
    session: Option<SessionRecord>,
    generation: u64,
    pending_start: Option<PendingStart>,
}

impl TimerEngine {
    /// Create an idle engine with settings and statistics loaded from `store`
    /// (defaults where absent or invalid).
    ///
    /// Call [`TimerEngine::init`] before use to pick up a running session.
    pub fn new(
        store: DurableStore,
        clock: impl Clock + 'static,
        notifier: impl Notifier + 'static,
    ) -> Self {
        let settings = store
            .get_settings()
            .filter(|s| match s.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "stored settings invalid, using defaults");
                    false
                }
            })
            .unwrap_or_default();
        let stats = store.get_stats().unwrap_or_default();
        let remaining_secs = Phase::Work.duration_secs(&settings);

        Self {
            settings,
            stats,
            store,
            clock: Arc::new(clock),
            notifier: Box::new(notifier),
            timing: TimingConfig::default(),
            state: TimerState::Idle,
            phase: Phase::Work,
            remaining_secs,
            completed_work_sessions: 0,
            session: None,
            generation: 0,
            pending_start: None,
        }
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Start-up: prepare notifications and restore any running session.
    pub fn init(&mut self) -> Vec<Event> {
        self.notifier.prepare();
        self.restore_on_init()
    }

    /// Tear-down: stop everything and forget the running session.
    pub fn destroy(&mut self) {
        self.invalidate();
        self.store.clear_session_record();
        self.session = None;
        self.state = TimerState::Idle;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn get_stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generation the decrement loop should run under, or `None` when no loop
    /// should be running.
    pub fn loop_generation(&self) -> Option<u64> {
        (self.state == TimerState::Running).then_some(self.generation)
    }

    pub fn pending_start(&self) -> Option<PendingStart> {
        self.pending_start
    }

    /// Nominal length of the current phase.
    pub fn total_secs(&self) -> u32 {
        self.phase.duration_secs(&self.settings)
    }

    /// 0.0 .. 1.0 progress within current phase.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        let remaining = self.remaining_secs.min(total);
        f64::from(total - remaining) / f64::from(total)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            display: format_countdown(self.remaining_secs),
            progress: self.progress(),
            completed_work_sessions: self.completed_work_sessions,
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn toggle_timer(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => self.pause(),
            TimerState::Idle | TimerState::Paused => self.start(),
        }
    }

    pub fn start(&mut self) -> Option<Event> {
        if self.state == TimerState::Running {
            return None;
        }
        if self.remaining_secs == 0 {
            self.remaining_secs = self.total_secs();
        }

        let now = self.clock.now_ms();
        let record = SessionRecord {
            start_timestamp: now,
            initial_remaining_seconds: self.remaining_secs,
            phase: self.phase,
            completed_work_sessions: self.completed_work_sessions,
            last_update_timestamp: now,
            active: true,
        };
        self.store.set_session_record(&record);
        self.session = Some(record);
        self.state = TimerState::Running;
        self.invalidate();
        self.notifier.start_cue(&self.settings);

        Some(Event::TimerStarted {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.invalidate();
        self.store.clear_session_record();
        self.session = None;
        self.state = TimerState::Paused;
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.invalidate();
        self.store.clear_session_record();
        self.session = None;
        self.remaining_secs = self.total_secs();
        self.state = TimerState::Idle;
        Some(Event::TimerReset {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    /// One second of countdown. No-op unless running.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state != TimerState::Running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return self.complete_session();
        }

        let now = self.clock.now_ms();
        if let Some(record) = self.session.as_mut() {
            record.last_update_timestamp = now;
            self.store.set_session_record(record);
        }
        Vec::new()
    }

    /// A tick delivered by a loop armed for `generation`.
    pub fn on_tick(&mut self, generation: u64) -> Vec<Event> {
        if self.loop_generation() != Some(generation) {
            tracing::debug!(generation, current = self.generation, "dropping stale tick");
            return Vec::new();
        }
        self.tick()
    }

    /// End the current phase and load the next one.
    pub fn complete_session(&mut self) -> Vec<Event> {
        self.invalidate();
        self.store.clear_session_record();
        self.session = None;

        let completed = self.phase;
        let now = self.clock.now();
        if completed == Phase::Work {
            self.completed_work_sessions = self.completed_work_sessions.saturating_add(1);
            self.stats
                .record_work_session(&day_key(now), self.settings.work_minutes);
            self.store.set_stats(&self.stats);
        }

        let next = next_phase(
            completed,
            self.completed_work_sessions,
            self.settings.pomodoros_until_long_break,
        );
        self.phase = next;
        self.remaining_secs = next.duration_secs(&self.settings);
        self.state = TimerState::Idle;

        tracing::info!(
            completed = ?completed,
            next = ?next,
            completed_work_sessions = self.completed_work_sessions,
            "phase complete"
        );

        let mut events = vec![
            Event::TimerCompleted {
                phase: completed,
                completed_work_sessions: self.completed_work_sessions,
                at: now,
            },
            Event::PhaseChanged {
                from: completed,
                to: next,
                duration_secs: self.remaining_secs,
                at: now,
            },
        ];

        self.notifier.phase_complete(completed, next, &self.settings);

        if next.auto_starts(&self.settings) {
            let pending = PendingStart {
                generation: self.generation,
                delay: self.timing.auto_start_delay(),
            };
            self.pending_start = Some(pending);
            events.push(Event::AutoStartScheduled {
                phase: next,
                delay_ms: u64::try_from(pending.delay.as_millis()).unwrap_or(u64::MAX),
                at: now,
            });
        }
        events
    }

    /// Fire an auto-start armed for `generation`.
    pub fn fire_auto_start(&mut self, generation: u64) -> Option<Event> {
        match self.pending_start {
            Some(pending) if pending.generation == generation && self.generation == generation => {
                self.pending_start = None;
                self.start()
            }
            _ => {
                tracing::debug!(generation, current = self.generation, "dropping stale auto-start");
                None
            }
        }
    }

    /// Fire a pending auto-start without waiting for its delay.
    pub fn start_pending_now(&mut self) -> Option<Event> {
        let pending = self.pending_start?;
        self.fire_auto_start(pending.generation)
    }

    /// Correct the countdown against the persisted wall-clock anchor.
    pub fn reconcile(&mut self) -> Vec<Event> {
        if self.state != TimerState::Running {
            return Vec::new();
        }
        // A failed write leaves only the in-memory copy to go on.
        let record = match self.store.get_session_record() {
            Some(record) if record.active => record,
            _ => match &self.session {
                Some(record) => record.clone(),
                None => return Vec::new(),
            },
        };

        let expected = record.expected_remaining(self.clock.now_ms());
        if expected <= 0 {
            tracing::info!(phase = ?self.phase, "phase ran out while unobserved");
            return self.complete_session();
        }

        let drift = i64::from(self.remaining_secs) - expected;
        if drift.abs() <= i64::from(self.timing.drift_tolerance_secs) {
            return Vec::new();
        }

        self.remaining_secs = u32::try_from(expected).unwrap_or(u32::MAX);
        tracing::info!(drift, remaining = self.remaining_secs, "countdown resynchronized");
        vec![Event::TimerSynced {
            drift_secs: drift,
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        }]
    }

    /// The view became visible again.
    pub fn visibility_regained(&mut self) -> Vec<Event> {
        self.reconcile()
    }

    /// The window got focus again.
    pub fn focus_regained(&mut self) -> Vec<Event> {
        self.reconcile()
    }

    /// Pick up a session that was running when the process last stopped.
    pub fn restore_on_init(&mut self) -> Vec<Event> {
        let record = match self.store.get_session_record() {
            Some(record) if record.active => record,
            Some(_) => {
                self.store.clear_session_record();
                return self.start_idle();
            }
            None => return self.start_idle(),
        };

        self.phase = record.phase;
        self.completed_work_sessions = record.completed_work_sessions;

        let expected = record.expected_remaining(self.clock.now_ms());
        if expected <= 0 {
            tracing::info!(phase = ?record.phase, "session finished while closed");
            self.remaining_secs = 0;
            return self.complete_session();
        }

        self.remaining_secs = u32::try_from(expected).unwrap_or(u32::MAX);
        self.session = Some(record);
        self.state = TimerState::Running;
        self.invalidate();
        tracing::info!(
            phase = ?self.phase,
            remaining = self.remaining_secs,
            "restored running session"
        );
        vec![Event::SessionRestored {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        }]
    }

    /// Change the work duration. Refreshes the countdown only while idle in a
    /// work phase; otherwise the new value applies from the next work phase.
    pub fn update_work_duration(&mut self, minutes: u32) -> Result<Event, ValidationError> {
        if minutes == 0 {
            return Err(ValidationError::InvalidDuration {
                field: "workMinutes".into(),
                value: minutes.to_string(),
                last_good: self.settings.work_minutes,
            });
        }
        self.settings.work_minutes = minutes;
        if self.state == TimerState::Idle && self.phase == Phase::Work {
            self.remaining_secs = self.total_secs();
        }
        self.store.set_settings(&self.settings);
        Ok(Event::WorkDurationChanged {
            minutes,
            at: self.clock.now(),
        })
    }

    /// Apply a partial settings update and persist it.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Event, ValidationError> {
        let merged = self.settings.merged(patch)?;
        let duration_changed =
            merged.work_minutes != self.settings.work_minutes && self.phase == Phase::Work
                || merged.break_minutes != self.settings.break_minutes
                    && self.phase == Phase::Break
                || merged.long_break_minutes != self.settings.long_break_minutes
                    && self.phase == Phase::LongBreak;
        self.settings = merged;
        if duration_changed && self.state == TimerState::Idle {
            self.remaining_secs = self.total_secs();
        }
        self.store.set_settings(&self.settings);
        Ok(Event::SettingsUpdated {
            at: self.clock.now(),
        })
    }

    pub fn test_notification(&self) {
        self.notifier.test(&self.settings);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn start_idle(&mut self) -> Vec<Event> {
        self.state = TimerState::Idle;
        self.phase = Phase::Work;
        self.remaining_secs = self.total_secs();
        Vec::new()
    }

    /// Retire every callback armed so far.
    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::SilentNotifier;
    use crate::storage::MemoryKv;
    use crate::timer::ManualClock;

    fn engine() -> (TimerEngine, MemoryKv, ManualClock) {
        let kv = MemoryKv::new();
        let clock = ManualClock::default();
        let engine = TimerEngine::new(DurableStore::new(kv.clone()), clock.clone(), SilentNotifier);
        (engine, kv, clock)
    }

    #[test]
    fn start_pause_resume() {
        let (mut engine, kv, _) = engine();
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start().is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert!(kv.contains(crate::storage::SESSION_KEY));

        assert!(engine.pause().is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        assert!(!kv.contains(crate::storage::SESSION_KEY));

        assert!(engine.start().is_some());
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn start_while_running_is_noop() {
        let (mut engine, _, _) = engine();
        engine.start();
        let generation = engine.generation();
        assert!(engine.start().is_none());
        assert_eq!(engine.generation(), generation);
    }

    #[test]
    fn tick_decrements_and_refreshes_record() {
        let (mut engine, _, clock) = engine();
        engine.start();
        clock.advance_secs(1);
        assert!(engine.tick().is_empty());
        assert_eq!(engine.remaining_secs(), 1499);
        let record = engine.store.get_session_record().unwrap();
        assert_eq!(record.initial_remaining_seconds, 1500);
        assert_eq!(record.last_update_timestamp, clock.now_ms());
    }

    #[test]
    fn tick_is_ignored_when_not_running() {
        let (mut engine, _, _) = engine();
        assert!(engine.tick().is_empty());
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn stale_generation_cannot_resurrect_paused_timer() {
        let (mut engine, _, _) = engine();
        engine.start();
        let armed = engine.loop_generation().unwrap();
        engine.pause();
        assert!(engine.on_tick(armed).is_empty());
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.loop_generation(), None);
    }

    #[test]
    fn reset_restores_phase_duration() {
        let (mut engine, _, _) = engine();
        engine.start();
        for _ in 0..10 {
            engine.tick();
        }
        engine.reset();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(engine.store.get_session_record().is_none());
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let (engine, _, _) = engine();
        match engine.snapshot() {
            Event::StateSnapshot {
                state,
                phase,
                remaining_secs,
                display,
                progress,
                ..
            } => {
                assert_eq!(state, TimerState::Idle);
                assert_eq!(phase, Phase::Work);
                assert_eq!(remaining_secs, 25 * 60);
                assert_eq!(display, "25:00");
                assert_eq!(progress, 0.0);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_is_stamped_by_injected_clock() {
        let (engine, _, clock) = engine();
        clock.advance_secs(90);
        match engine.snapshot() {
            Event::StateSnapshot { at, .. } => assert_eq!(at, clock.now()),
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn auto_start_fires_only_for_its_generation() {
        let (mut engine, _, _) = engine();
        engine.start();
        let events = engine.complete_session();
        assert!(matches!(events.last(), Some(Event::AutoStartScheduled { .. })));
        let pending = engine.pending_start().unwrap();
        assert_eq!(pending.delay, Duration::from_millis(1000));

        engine.reset();
        assert!(engine.pending_start().is_none());
        assert!(engine.fire_auto_start(pending.generation).is_none());
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn auto_start_starts_next_phase() {
        let (mut engine, _, _) = engine();
        engine.start();
        engine.complete_session();
        let pending = engine.pending_start().unwrap();
        assert!(engine.fire_auto_start(pending.generation).is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.phase(), Phase::Break);
        assert_eq!(engine.remaining_secs(), 5 * 60);
    }

    #[test]
    fn inactive_record_is_discarded_on_init() {
        let (mut engine, kv, clock) = engine();
        engine.store.set_session_record(&SessionRecord {
            start_timestamp: clock.now_ms(),
            initial_remaining_seconds: 100,
            phase: Phase::Break,
            completed_work_sessions: 1,
            last_update_timestamp: clock.now_ms(),
            active: false,
        });
        assert!(engine.init().is_empty());
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.phase(), Phase::Work);
        assert!(!kv.contains(crate::storage::SESSION_KEY));
    }

    #[test]
    fn update_settings_refreshes_idle_countdown_for_current_phase() {
        let (mut engine, _, _) = engine();
        let patch = SettingsPatch {
            work_minutes: Some(40),
            ..Default::default()
        };
        engine.update_settings(&patch).unwrap();
        assert_eq!(engine.remaining_secs(), 40 * 60);
        assert_eq!(engine.store.get_settings().unwrap().work_minutes, 40);

        let bad = SettingsPatch {
            break_minutes: Some(0),
            ..Default::default()
        };
        assert!(engine.update_settings(&bad).is_err());
        assert_eq!(engine.settings().break_minutes, 5);
    }

    #[test]
    fn destroy_clears_session() {
        let (mut engine, kv, _) = engine();
        engine.start();
        engine.destroy();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.loop_generation(), None);
        assert!(!kv.contains(crate::storage::SESSION_KEY));
    }
}
