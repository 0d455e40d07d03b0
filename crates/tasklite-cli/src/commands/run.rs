//! Interactive foreground timer.
//!
//! The timer service renders a status line while stdin takes one command per
//! line. Quitting leaves a running session persisted, so the next `run` (or
//! `timer status`) picks it up where the wall clock says it should be.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::TerminalView;
use tasklite_core::settings::parse_minutes;
use tasklite_core::timer::day_key;
use tasklite_core::{Config, TimerEngine, TimerHandle, TimerService, View};

const HELP: &str = "commands: t(oggle) r(eset) w(ork) N n (test) s(tats) y (sync) q(uit)";

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut engine = super::open_engine(&config)?;
    let restored = engine.init();

    let mut view = TerminalView::new();
    for event in &restored {
        view.on_event(event);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(engine, view))
}

async fn serve(engine: TimerEngine, view: TerminalView) -> Result<(), Box<dyn std::error::Error>> {
    let mut work_minutes = engine.settings().work_minutes;
    let (handle, service) = TimerService::spawn(engine, view);
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !dispatch(&handle, line.trim(), &mut work_minutes).await? {
                    break;
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    handle.shutdown();
    let engine = service.await?;
    println!();
    tracing::debug!(state = ?engine.state(), "interactive session ended");
    Ok(())
}

/// Handle one input line. Returns `false` to quit.
async fn dispatch(
    handle: &TimerHandle,
    line: &str,
    work_minutes: &mut u32,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    match cmd {
        "" => {}
        "t" | "toggle" => handle.toggle_timer(),
        "r" | "reset" => handle.reset_timer(),
        "w" | "work" => match parse_minutes("workMinutes", arg, *work_minutes) {
            Ok(minutes) => {
                handle.update_work_duration(minutes).await?;
                *work_minutes = minutes;
            }
            Err(e) => eprintln!("\n{e}; keeping {work_minutes} minutes"),
        },
        "n" | "test" => handle.test_notification(),
        "s" | "stats" => {
            let stats = handle.get_stats().await?;
            let today = stats.day(&day_key(chrono::Utc::now()));
            eprintln!(
                "\ntoday: {} sessions, {} min | all time: {} sessions, {} min",
                today.completed_count,
                today.total_focus_minutes,
                stats.total_completed_work_sessions,
                stats.total_focus_minutes()
            );
        }
        "y" | "sync" => handle.focus_regained(),
        "q" | "quit" => return Ok(false),
        _ => eprintln!("\n{HELP}"),
    }
    Ok(true)
}
