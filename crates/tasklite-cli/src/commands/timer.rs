use clap::Subcommand;
use tasklite_core::{Config, Event, TimerEngine};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the timer, or pause it if it is running
    Toggle,
    /// Reset the current phase to its full duration
    Reset,
    /// Print current timer state as JSON
    Status,
}

/// Print the events of a one-shot operation followed by the resulting state.
fn print_events(events: &[Event], engine: &TimerEngine) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut engine = super::open_engine(&config)?;

    // Each invocation is a fresh start-up: pick up whatever was running.
    let mut events = engine.init();

    match action {
        TimerAction::Toggle => events.extend(engine.toggle_timer()),
        TimerAction::Reset => events.extend(engine.reset()),
        TimerAction::Status => {}
    }

    // Nothing stays alive to wait out the auto-start delay.
    events.extend(engine.start_pending_now());

    if matches!(action, TimerAction::Status) {
        println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    } else {
        print_events(&events, &engine)?;
    }
    Ok(())
}
