//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::io::Write;
use std::process::{Command, Stdio};

use pomobar_core::storage::{keys, SettingsStore, SqliteStore};
use tempfile::TempDir;

fn run_cli(dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomobar"))
        .args(args)
        .env("POMOBAR_DATA_DIR", dir.path())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn run_cli_success(dir: &TempDir, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
    stdout
}

#[test]
fn preset_list_shows_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(&dir, &["preset", "list"]);
    assert!(out.contains("* Classic"));
    assert!(out.contains("Quick"));
    assert!(out.contains("Deep Work"));
}

#[test]
fn preset_use_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_cli_success(&dir, &["preset", "use", "quick"]).trim(), "Quick");

    let status: serde_json::Value =
        serde_json::from_str(&run_cli_success(&dir, &["status"])).unwrap();
    assert_eq!(status["preset"]["name"], "Quick");
    assert_eq!(status["preset"]["focus_minutes"], 15);
    assert_eq!(status["completed_cycles"], 0);
}

#[test]
fn status_survives_corrupt_counter() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = SqliteStore::open(&dir.path().join("pomobar.db")).unwrap();
        store.set_raw(keys::COMPLETED_CYCLES, "garbage").unwrap();
        store.set_raw(keys::TODAY_FOCUS_MINUTES, "lots").unwrap();
    }

    let status: serde_json::Value =
        serde_json::from_str(&run_cli_success(&dir, &["status"])).unwrap();
    assert_eq!(status["completed_cycles"], 0);
    assert_eq!(status["stats"]["today"]["focus_minutes"], 0);
}

#[test]
fn status_uses_configured_default_preset() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(
        &dir,
        &[
            "config",
            "set",
            "presets",
            r#"[{"name":"Classic","focus_minutes":30,"short_break_minutes":5,"long_break_minutes":15}]"#,
        ],
    );

    let status: serde_json::Value =
        serde_json::from_str(&run_cli_success(&dir, &["status"])).unwrap();
    assert_eq!(status["preset"]["name"], "Classic");
    assert_eq!(status["preset"]["focus_minutes"], 30);
    assert!(run_cli_success(&dir, &["preset", "list"]).contains("* Classic"));
}

#[test]
fn status_reports_notification_state() {
    let dir = tempfile::tempdir().unwrap();
    let status: serde_json::Value =
        serde_json::from_str(&run_cli_success(&dir, &["status"])).unwrap();
    assert_eq!(status["notification_status"]["status"], "unknown");

    run_cli_success(&dir, &["settings", "set", "notificationsEnabled", "false"]);
    let status: serde_json::Value =
        serde_json::from_str(&run_cli_success(&dir, &["status"])).unwrap();
    assert_eq!(status["notification_status"]["status"], "disabled");
}

#[test]
fn unknown_preset_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["preset", "use", "siesta"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown preset"));
}

#[test]
fn settings_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_cli_success(&dir, &["settings", "get", "autoStartBreaks"]).trim(), "false");
    run_cli_success(&dir, &["settings", "set", "autoStartBreaks", "true"]);
    assert_eq!(run_cli_success(&dir, &["settings", "get", "autoStartBreaks"]).trim(), "true");

    let (_, _, code) = run_cli(&dir, &["settings", "set", "darkMode", "true"]);
    assert_ne!(code, 0);
}

#[test]
fn config_get_and_set() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_cli_success(&dir, &["config", "get", "stats.skip_credit"]).trim(), "full");
    run_cli_success(&dir, &["config", "set", "stats.skip_credit", "elapsed"]);
    assert_eq!(run_cli_success(&dir, &["config", "get", "stats.skip_credit"]).trim(), "elapsed");

    let (_, _, code) = run_cli(&dir, &["config", "set", "stats.skip_credit", "half"]);
    assert_ne!(code, 0);
}

#[test]
fn stats_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let stats: serde_json::Value =
        serde_json::from_str(&run_cli_success(&dir, &["stats"])).unwrap();
    assert_eq!(stats["today"]["focus_minutes"], 0);
    assert_eq!(stats["current_streak"], 0);
}

#[test]
fn run_reads_commands_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_pomobar"))
        .args(["run", "--quiet", "--preset", "quick"])
        .env("POMOBAR_DATA_DIR", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"start\nskip\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let events: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events[0]["state"], "stopped");
    assert_eq!(events[0]["preset"]["name"], "Quick");
    assert!(events.iter().any(|e| e["type"] == "timer_started"));
    let completed = events
        .iter()
        .find(|e| e["type"] == "phase_completed")
        .expect("phase_completed event");
    assert_eq!(completed["next"], "short_break");
    assert_eq!(completed["skipped"], true);

    let stats: serde_json::Value =
        serde_json::from_str(&run_cli_success(&dir, &["stats"])).unwrap();
    assert_eq!(stats["today"]["completed_cycles"], 1);
}
