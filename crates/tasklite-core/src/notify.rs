//! Best-effort phase notifications.
//!
//! Sound goes through an ordered [`FallbackChain`]: each strategy is tried in
//! turn, the first success wins, and running out of strategies is absorbed.
//! The visual path is independent: a desktop notification when permission is
//! granted, otherwise an alert. Nothing in here can fail the caller.

use crate::error::NotifyError;
use crate::settings::Settings;
use crate::timer::Phase;

/// Which sound to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A run has started.
    Start,
    /// A phase has ended.
    Complete,
}

/// One way of producing a sound (or a substitute for one).
pub trait CueStrategy: Send {
    fn name(&self) -> &str;
    fn play(&self, cue: Cue) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Not asked yet.
    Default,
}

pub trait DesktopNotifier: Send {
    fn permission(&self) -> Permission;

    /// Ask for permission. Fire-and-forget; the answer shows up in later
    /// `permission()` calls.
    fn request_permission(&self) {}

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Last-resort visual notice.
pub trait Alert: Send {
    fn alert(&self, message: &str);
}

/// What the timer engine needs from the notification sink.
pub trait Notifier: Send {
    /// Ask for desktop-notification permission if it has never been asked.
    fn prepare(&self) {}

    fn start_cue(&self, settings: &Settings);

    /// `completed` just ended and `next` is now loaded.
    fn phase_complete(&self, completed: Phase, next: Phase, settings: &Settings);

    fn test(&self, settings: &Settings);
}

/// Strategies tried in order until one succeeds.
#[derive(Default)]
pub struct FallbackChain {
    strategies: Vec<Box<dyn CueStrategy>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, strategy: impl CueStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Name of the strategy that succeeded, if any did.
    pub fn play(&self, cue: Cue) -> Option<&str> {
        for strategy in &self.strategies {
            match strategy.play(cue) {
                Ok(()) => return Some(strategy.name()),
                Err(e) => tracing::debug!(strategy = strategy.name(), error = %e, "cue strategy failed"),
            }
        }
        if !self.strategies.is_empty() {
            tracing::warn!(?cue, "every sound strategy failed");
        }
        None
    }
}

/// Message shown when a phase ends, phrased for the phase that comes next.
pub fn completion_message(next: Phase, settings: &Settings) -> String {
    match next {
        Phase::Break => format!(
            "Work session complete! Time for a {}-minute break.",
            settings.break_minutes
        ),
        Phase::LongBreak => format!(
            "Work session complete! Time for a {}-minute long break.",
            settings.long_break_minutes
        ),
        Phase::Work => "Break complete! Time to get back to work.".to_string(),
    }
}

/// Sound chain plus desktop notification with alert fallback.
pub struct CascadingNotifier {
    app_name: String,
    sounds: FallbackChain,
    desktop: Box<dyn DesktopNotifier>,
    alert: Box<dyn Alert>,
}

impl CascadingNotifier {
    pub fn new(
        app_name: impl Into<String>,
        sounds: FallbackChain,
        desktop: impl DesktopNotifier + 'static,
        alert: impl Alert + 'static,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            sounds,
            desktop: Box::new(desktop),
            alert: Box::new(alert),
        }
    }

    fn play(&self, cue: Cue, settings: &Settings) {
        if settings.sound_notifications {
            self.sounds.play(cue);
        }
    }

    fn announce(&self, title: &str, body: &str, alert_text: &str, settings: &Settings) {
        if !settings.desktop_notifications {
            return;
        }
        let shown = match self.desktop.permission() {
            Permission::Granted => self.desktop.show(title, body),
            Permission::Denied | Permission::Default => Err(NotifyError::PermissionDenied),
        };
        if let Err(e) = shown {
            tracing::debug!(error = %e, "showing alert instead of desktop notification");
            self.alert.alert(alert_text);
        }
    }
}

impl Notifier for CascadingNotifier {
    fn prepare(&self) {
        if self.desktop.permission() == Permission::Default {
            self.desktop.request_permission();
        }
    }

    fn start_cue(&self, settings: &Settings) {
        self.play(Cue::Start, settings);
    }

    fn phase_complete(&self, _completed: Phase, next: Phase, settings: &Settings) {
        self.play(Cue::Complete, settings);
        let message = completion_message(next, settings);
        let title = format!("{} - Focus Timer", self.app_name);
        self.announce(&title, &message, &message, settings);
    }

    fn test(&self, settings: &Settings) {
        self.play(Cue::Complete, settings);
        let title = format!("{} - Test", self.app_name);
        self.announce(
            &title,
            "Notification sound tested!",
            "Sound test complete!",
            settings,
        );
    }
}

/// A notifier that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn start_cue(&self, _settings: &Settings) {}
    fn phase_complete(&self, _completed: Phase, _next: Phase, _settings: &Settings) {}
    fn test(&self, _settings: &Settings) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Scripted {
        name: &'static str,
        works: bool,
        log: Log,
    }

    impl CueStrategy for Scripted {
        fn name(&self) -> &str {
            self.name
        }
        fn play(&self, _cue: Cue) -> Result<(), NotifyError> {
            self.log.lock().unwrap().push(self.name.to_string());
            if self.works {
                Ok(())
            } else {
                Err(NotifyError::Unavailable(self.name.to_string()))
            }
        }
    }

    struct FakeDesktop {
        permission: Permission,
        fails: bool,
        log: Log,
    }

    impl DesktopNotifier for FakeDesktop {
        fn permission(&self) -> Permission {
            self.permission
        }
        fn request_permission(&self) {
            self.log.lock().unwrap().push("request".into());
        }
        fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
            self.log.lock().unwrap().push(format!("desktop:{title}:{body}"));
            if self.fails {
                Err(NotifyError::Failed {
                    strategy: "desktop".into(),
                    message: "no bus".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    struct FakeAlert(Log);

    impl Alert for FakeAlert {
        fn alert(&self, message: &str) {
            self.0.lock().unwrap().push(format!("alert:{message}"));
        }
    }

    fn strategy(name: &'static str, works: bool, log: &Log) -> Scripted {
        Scripted {
            name,
            works,
            log: log.clone(),
        }
    }

    fn notifier(permission: Permission, desktop_fails: bool, log: &Log) -> CascadingNotifier {
        let sounds = FallbackChain::new()
            .then(strategy("tone", false, log))
            .then(strategy("recorded", true, log))
            .then(strategy("haptic", true, log));
        CascadingNotifier::new(
            "TaskLite",
            sounds,
            FakeDesktop {
                permission,
                fails: desktop_fails,
                log: log.clone(),
            },
            FakeAlert(log.clone()),
        )
    }

    #[test]
    fn chain_stops_at_first_success() {
        let log = Log::default();
        let chain = FallbackChain::new()
            .then(strategy("tone", false, &log))
            .then(strategy("recorded", true, &log))
            .then(strategy("haptic", true, &log));
        assert_eq!(chain.play(Cue::Complete), Some("recorded"));
        assert_eq!(*log.lock().unwrap(), vec!["tone", "recorded"]);
    }

    #[test]
    fn exhausted_chain_is_absorbed() {
        let log = Log::default();
        let chain = FallbackChain::new()
            .then(strategy("tone", false, &log))
            .then(strategy("recorded", false, &log))
            .then(strategy("haptic", false, &log));
        assert_eq!(chain.play(Cue::Start), None);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn granted_permission_uses_desktop_notification() {
        let log = Log::default();
        notifier(Permission::Granted, false, &log).phase_complete(
            Phase::Work,
            Phase::Break,
            &Settings::default(),
        );
        let log = log.lock().unwrap();
        assert_eq!(log[0], "tone");
        assert_eq!(log[1], "recorded");
        assert_eq!(
            log[2],
            "desktop:TaskLite - Focus Timer:Work session complete! Time for a 5-minute break."
        );
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn denied_permission_falls_back_to_alert() {
        let log = Log::default();
        notifier(Permission::Denied, false, &log).phase_complete(
            Phase::Break,
            Phase::Work,
            &Settings::default(),
        );
        let log = log.lock().unwrap();
        assert_eq!(
            log.last().unwrap(),
            "alert:Break complete! Time to get back to work."
        );
    }

    #[test]
    fn failed_desktop_notification_falls_back_to_alert() {
        let log = Log::default();
        notifier(Permission::Granted, true, &log).test(&Settings::default());
        let log = log.lock().unwrap();
        assert_eq!(log.last().unwrap(), "alert:Sound test complete!");
    }

    #[test]
    fn disabled_settings_silence_everything() {
        let log = Log::default();
        let settings = Settings {
            sound_notifications: false,
            desktop_notifications: false,
            ..Settings::default()
        };
        let n = notifier(Permission::Granted, false, &log);
        n.start_cue(&settings);
        n.phase_complete(Phase::Work, Phase::LongBreak, &settings);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn prepare_requests_permission_once_when_unasked() {
        let log = Log::default();
        notifier(Permission::Default, false, &log).prepare();
        notifier(Permission::Granted, false, &log).prepare();
        assert_eq!(*log.lock().unwrap(), vec!["request"]);
    }

    #[test]
    fn long_break_message_names_minutes() {
        let settings = Settings {
            long_break_minutes: 20,
            ..Settings::default()
        };
        assert_eq!(
            completion_message(Phase::LongBreak, &settings),
            "Work session complete! Time for a 20-minute long break."
        );
    }
}
