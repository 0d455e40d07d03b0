mod clock;
mod engine;
mod phase;

pub use clock::{day_key, Clock, ManualClock, SystemClock};
pub use engine::{PendingStart, TimerEngine, TimerState};
pub use phase::{next_phase, Phase};
