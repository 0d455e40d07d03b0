//! Terminal and desktop notification adapters.

use std::io::{IsTerminal, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use notify_rust::Notification;
use tasklite_core::notify::{
    Alert, CascadingNotifier, Cue, CueStrategy, DesktopNotifier, FallbackChain, Permission,
};
use tasklite_core::storage::NotificationsConfig;
use tasklite_core::NotifyError;

/// Set to any value to keep desktop notifications off.
const NO_DESKTOP_ENV: &str = "TASKLITE_NO_DESKTOP";

/// Sound players and files tried in order by [`SystemSound`].
const SOUND_COMMANDS: &[(&str, &str)] = &[
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
    ("aplay", "/usr/share/sounds/generic.wav"),
];

/// Build the notifier used by every command.
pub fn notifier(config: &NotificationsConfig) -> CascadingNotifier {
    // No haptic device on a desktop terminal.
    let sounds = FallbackChain::new().then(BellTone).then(SystemSound);
    CascadingNotifier::new(
        config.app_name.clone(),
        sounds,
        NotifyRustDesktop {
            app_name: config.app_name.clone(),
        },
        StderrAlert,
    )
}

/// Terminal bell, if stderr is a terminal.
pub struct BellTone;

impl CueStrategy for BellTone {
    fn name(&self) -> &str {
        "bell"
    }

    fn play(&self, cue: Cue) -> Result<(), NotifyError> {
        let mut stderr = std::io::stderr();
        if !stderr.is_terminal() {
            return Err(NotifyError::Unavailable("terminal bell".into()));
        }
        let bell = match cue {
            Cue::Start => "\x07",
            Cue::Complete => "\x07\x07",
        };
        stderr
            .write_all(bell.as_bytes())
            .and_then(|()| stderr.flush())
            .map_err(|e| NotifyError::Failed {
                strategy: self.name().into(),
                message: e.to_string(),
            })
    }
}

/// A system sound file played by an external player.
pub struct SystemSound;

impl CueStrategy for SystemSound {
    fn name(&self) -> &str {
        "system-sound"
    }

    fn play(&self, _cue: Cue) -> Result<(), NotifyError> {
        let (cmd, file) = SOUND_COMMANDS
            .iter()
            .find(|(_, file)| Path::new(file).exists())
            .ok_or_else(|| NotifyError::Unavailable("system sound".into()))?;

        let mut child = Command::new(cmd)
            .arg(file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| NotifyError::Failed {
                strategy: format!("{} ({cmd})", self.name()),
                message: e.to_string(),
            })?;

        // Reap the player off the timer's path so it never lingers as a zombie.
        let player = cmd.to_string();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                tracing::debug!(player, %status, "sound player exited with failure");
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(player, error = %e, "could not wait for sound player"),
        });
        Ok(())
    }
}

/// Desktop notifications through the platform notification service.
pub struct NotifyRustDesktop {
    app_name: String,
}

impl DesktopNotifier for NotifyRustDesktop {
    fn permission(&self) -> Permission {
        if std::env::var_os(NO_DESKTOP_ENV).is_some() {
            Permission::Denied
        } else {
            Permission::Granted
        }
    }

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        Notification::new()
            .summary(title)
            .body(body)
            .appname(&self.app_name)
            .show()
            .map(drop)
            .map_err(|e| NotifyError::Failed {
                strategy: "desktop".into(),
                message: e.to_string(),
            })
    }
}

/// Banner on stderr.
pub struct StderrAlert;

impl Alert for StderrAlert {
    fn alert(&self, message: &str) {
        let rule = "=".repeat(message.chars().count().max(20));
        eprintln!("\n{rule}\n{message}\n{rule}");
    }
}
