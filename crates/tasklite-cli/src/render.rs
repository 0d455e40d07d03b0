//! Single-line terminal rendering of the timer.

use std::io::Write;

use tasklite_core::{Event, TimerState, View};

const BAR_WIDTH: usize = 20;

/// Redraws one status line on stdout; notable events get their own line.
#[derive(Default)]
pub struct TerminalView {
    last_line: String,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    fn print_above(&mut self, message: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "\r\x1b[2K{message}");
        let _ = write!(out, "{}", self.last_line);
        let _ = out.flush();
    }
}

impl View for TerminalView {
    fn render(&mut self, snapshot: &Event) {
        let Some(line) = status_line(snapshot) else {
            return;
        };
        if line == self.last_line {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r\x1b[2K{line}");
        let _ = out.flush();
        self.last_line = line;
    }

    fn on_event(&mut self, event: &Event) {
        match event {
            Event::TimerSynced { drift_secs, .. } => {
                self.print_above(&format!("⟳ synced ({drift_secs:+}s)"));
            }
            Event::SessionRestored { phase, .. } => {
                self.print_above(&format!("restored running {phase}"));
            }
            Event::PhaseChanged { from, to, .. } => {
                self.print_above(&format!("{from} finished, next: {to}"));
            }
            _ => {}
        }
    }
}

/// `[Focus Session] 24:59 [#-------------------] running (0 done)`
pub fn status_line(snapshot: &Event) -> Option<String> {
    let Event::StateSnapshot {
        state,
        phase_label,
        display,
        progress,
        completed_work_sessions,
        ..
    } = snapshot
    else {
        return None;
    };

    let filled = ((progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));
    let state = match state {
        TimerState::Idle => "idle",
        TimerState::Running => "running",
        TimerState::Paused => "paused",
    };
    Some(format!(
        "[{phase_label}] {display} [{bar}] {state} ({completed_work_sessions} done)"
    ))
}
