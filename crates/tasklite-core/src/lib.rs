//! # TaskLite Core Library
//!
//! The focus-timer ("pomodoro") engine behind TaskLite: a countdown that
//! survives restarts, suspension and clock drift by anchoring every run to a
//! durable, timestamped session record.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-anchored state machine; the caller delivers
//!   ticks and reconciliation requests
//! - **Phase Policy**: pure work / break / long-break sequencing
//! - **Storage**: typed JSON records over a key-value backend (SQLite or memory)
//!   plus TOML application configuration
//! - **Notifications**: ordered sound fallbacks and desktop/alert notices
//! - **Service**: a single tokio task that owns the engine and serializes
//!   every mutation
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerService`]: Drives the engine's loops and renders to a [`View`]
//! - [`DurableStore`]: Settings, statistics and session persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod service;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, NotifyError, StoreError, ValidationError};
pub use events::Event;
pub use notify::{CascadingNotifier, FallbackChain, Notifier};
pub use service::{TimerHandle, TimerService, View};
pub use settings::{Settings, SettingsPatch};
pub use stats::{DayStats, Statistics};
pub use storage::{Config, Database, DurableStore, KeyValue, MemoryKv, SessionRecord};
pub use timer::{next_phase, Clock, ManualClock, Phase, SystemClock, TimerEngine, TimerState};
