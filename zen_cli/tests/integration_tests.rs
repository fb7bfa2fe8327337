//! Integration tests for the zen binary.
//!
//! These tests verify end-to-end behavior including:
//! - Session crediting and streak bookkeeping
//! - Input validation
//! - Configuration overrides
//! - Garden and technique listings

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to run the CLI against an isolated data and config directory
fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zen"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn status_json(data_dir: &Path) -> serde_json::Value {
    let output = cli(data_dir)
        .arg("status")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("status --json should print JSON")
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Meditation timer with a garden that grows with you",
        ));
}

#[test]
fn test_fresh_status_shows_defaults() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let status = status_json(data_dir);
    assert_eq!(status["total_minutes"], 0);
    assert_eq!(status["streak_days"], 0);
    assert_eq!(status["garden_level"], 1);
    assert!(status["last_meditation_day"].is_null());

    // Reading never creates the storage file
    assert!(!data_dir.join("storage.json").exists());
}

#[test]
fn test_default_command_is_status() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Bare soil"))
        .stdout(predicate::str::contains("Zen Garden · Level 1"));
}

#[test]
fn test_logged_sessions_build_streak() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["log", "--minutes", "10", "--date", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 10m · Streak: 1d · Garden: Lv. 2"));

    cli(data_dir)
        .args(["log", "--minutes", "20", "--date", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Streak: 1d"));

    cli(data_dir)
        .args(["log", "--minutes", "5", "--date", "2024-01-02"])
        .assert()
        .success();

    let status = status_json(data_dir);
    assert_eq!(status["total_minutes"], 35);
    assert_eq!(status["streak_days"], 2);
    assert_eq!(status["last_meditation_day"], "2024-01-02");
    assert_eq!(status["garden_level"], 4);

    // A gap resets the streak but keeps the minutes
    cli(data_dir)
        .args(["log", "--minutes", "5", "--date", "2024-01-05"])
        .assert()
        .success();
    let status = status_json(data_dir);
    assert_eq!(status["total_minutes"], 40);
    assert_eq!(status["streak_days"], 1);
}

#[test]
fn test_storage_keys_written() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["log", "--minutes", "60", "--date", "2024-03-01"])
        .assert()
        .success();

    let raw = fs::read_to_string(data_dir.join("storage.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["zen_meditation_total"], "60");
    assert_eq!(stored["zen_meditation_streak"], "1");
    assert_eq!(stored["zen_last_meditation_day"], "2024-03-01");
    assert_eq!(stored["zen_garden_level"], "5");
}

#[test]
fn test_meditate_auto_complete_credits_full_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["meditate", "--minutes", "15", "--technique", "box", "--auto-complete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Box"))
        .stdout(predicate::str::contains(
            "Session complete: 15 minutes of peace",
        ));

    let status = status_json(data_dir);
    assert_eq!(status["total_minutes"], 15);
    assert_eq!(status["streak_days"], 1);
    assert_eq!(status["garden_level"], 3);
}

#[test]
fn test_meditate_uses_configured_defaults() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["meditate", "--auto-complete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10 min · Calm"));

    assert_eq!(status_json(data_dir)["total_minutes"], 10);
}

#[test]
fn test_meditate_with_preset() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["meditate", "--preset", "15", "--auto-complete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("15 min · Calm"))
        .stdout(predicate::str::contains(
            "Session complete: 15 minutes of peace",
        ));

    assert_eq!(status_json(data_dir)["total_minutes"], 15);
}

#[test]
fn test_unknown_preset_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["meditate", "--preset", "7", "--auto-complete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid session"))
        .stderr(predicate::str::contains("5, 10, 15, 20"));

    assert!(!data_dir.join("storage.json").exists());
}

#[test]
fn test_preset_conflicts_with_minutes() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["meditate", "--preset", "5", "--minutes", "10", "--auto-complete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_configured_presets_are_offered() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let config_path = data_dir.join("presets.toml");
    fs::write(&config_path, "[session]\npresets = [3, 45]\n").unwrap();

    cli(data_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["meditate", "--preset", "45", "--auto-complete"])
        .assert()
        .success();
    assert_eq!(status_json(data_dir)["total_minutes"], 45);

    cli(data_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["meditate", "--preset", "15", "--auto-complete"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_durations_rejected_without_mutation() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    for minutes in ["0", "121", "ten"] {
        cli(data_dir)
            .args(["meditate", "--auto-complete", "--minutes", minutes])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid session"));
    }

    cli(data_dir)
        .args(["log", "--minutes", "0"])
        .assert()
        .failure();

    assert!(!data_dir.join("storage.json").exists());
}

#[test]
fn test_unknown_technique_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["meditate", "--auto-complete", "--technique", "wim_hof"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wim_hof"));

    assert!(!data_dir.join("storage.json").exists());
}

#[test]
fn test_techniques_listing() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("techniques")
        .assert()
        .success()
        .stdout(predicate::str::contains("* calm"))
        .stdout(predicate::str::contains("16s cycle"))
        .stdout(predicate::str::contains("box"))
        .stdout(predicate::str::contains("4-7-8"))
        .stdout(predicate::str::contains("19s cycle"));
}

#[test]
fn test_garden_grows_with_level() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["log", "--minutes", "120", "--date", "2024-01-01"])
        .assert()
        .success();
    cli(data_dir)
        .args(["log", "--minutes", "120", "--date", "2024-01-02"])
        .assert()
        .success();
    cli(data_dir)
        .args(["log", "--minutes", "120", "--date", "2024-01-03"])
        .assert()
        .success();

    let output = cli(data_dir)
        .arg("garden")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();

    assert!(text.contains("Level 8"));
    let rows: Vec<_> = text.lines().skip(1).collect();
    assert_eq!(rows.len(), 4);
    // Level 8 fills the first 32 cells: three full rows of plants
    assert!(!rows[0].contains('·'));
    assert!(!rows[2].contains('·'));
}

#[test]
fn test_config_override_key_prefix() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let config_path = data_dir.join("custom.toml");
    fs::write(
        &config_path,
        r#"
[storage]
key_prefix = "clobile"

[session]
default_minutes = 20
"#,
    )
    .unwrap();

    cli(data_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["meditate", "--auto-complete"])
        .assert()
        .success();

    let raw = fs::read_to_string(data_dir.join("storage.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["clobile_meditation_total"], "20");
    assert!(stored.get("zen_meditation_total").is_none());
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let config_path = data_dir.join("bad.toml");
    fs::write(&config_path, "[session]\ndefault_technique = \"nope\"\n").unwrap();

    cli(data_dir)
        .arg("--config")
        .arg(&config_path)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
