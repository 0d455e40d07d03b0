//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_tasklite"))
        .args(args)
        .env("TASKLITE_DATA_DIR", data_dir)
        .env("TASKLITE_NO_DESKTOP", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// A fresh data directory with sounds turned off.
fn quiet_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["settings", "set", "soundNotifications", "false"]);
    assert_eq!(code, 0, "settings set failed: {stderr}");
    dir
}

fn status(dir: &Path) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(dir, &["timer", "status"]);
    assert_eq!(code, 0, "timer status failed: {stderr}");
    serde_json::from_str(&stdout).expect("status is JSON")
}

#[test]
fn test_status_starts_idle() {
    let dir = quiet_dir();
    let json = status(dir.path());
    assert_eq!(json["type"], "StateSnapshot");
    assert_eq!(json["state"], "idle");
    assert_eq!(json["phase"], "work");
    assert_eq!(json["remaining_secs"], 1500);
    assert_eq!(json["display"], "25:00");
}

#[test]
fn test_toggle_survives_between_invocations() {
    let dir = quiet_dir();
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "toggle"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TimerStarted"));

    let json = status(dir.path());
    assert_eq!(json["state"], "running");
    let remaining = json["remaining_secs"].as_u64().unwrap();
    assert!((1490..=1500).contains(&remaining), "remaining {remaining}");

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "reset"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TimerReset"));
    assert_eq!(status(dir.path())["state"], "idle");
}

#[test]
fn test_work_minutes_setting_changes_countdown() {
    let dir = quiet_dir();
    let (code, stdout, _) = run_cli(dir.path(), &["settings", "set", "workMinutes", "30"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (_, stdout, _) = run_cli(dir.path(), &["settings", "get", "workMinutes"]);
    assert_eq!(stdout.trim(), "30");
    assert_eq!(status(dir.path())["remaining_secs"], 1800);
}

#[test]
fn test_invalid_setting_is_rejected() {
    let dir = quiet_dir();
    let (code, _, stderr) = run_cli(dir.path(), &["settings", "set", "workMinutes", "abc"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));

    let (code, _, _) = run_cli(dir.path(), &["settings", "set", "breakMinutes", "0"]);
    assert_ne!(code, 0);

    let (code, _, _) = run_cli(dir.path(), &["settings", "get", "noSuchKey"]);
    assert_ne!(code, 0);

    let (_, stdout, _) = run_cli(dir.path(), &["settings", "get", "workMinutes"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_settings_list_and_reset() {
    let dir = quiet_dir();
    let (_, stdout, _) = run_cli(dir.path(), &["settings", "list"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["soundNotifications"], false);
    assert_eq!(json["pomodorosUntilLongBreak"], 4);

    let (code, _, _) = run_cli(dir.path(), &["settings", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["settings", "get", "soundNotifications"]);
    assert_eq!(stdout.trim(), "true");
}

#[test]
fn test_stats_start_empty() {
    let dir = quiet_dir();
    let (code, stdout, _) = run_cli(dir.path(), &["stats"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["totalCompletedWorkSessions"], 0);

    let (code, stdout, _) = run_cli(dir.path(), &["stats", "--today"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["completedCount"], 0);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timing.reconcile_interval_secs"]);
    assert_eq!(stdout.trim(), "5");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timing.reconcile_interval_secs", "10"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timing.reconcile_interval_secs"]);
    assert_eq!(stdout.trim(), "10");
    assert!(dir.path().join("config.toml").exists());

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timing.nope", "1"]);
    assert_ne!(code, 0);

    let (code, _, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "notifications.app_name"]);
    assert_eq!(stdout.trim(), "TaskLite");
}
