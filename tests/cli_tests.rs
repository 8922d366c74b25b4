//! Integration tests for the kiosk-controls CLI
//!
//! These tests run the actual binary against temporary config files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CONFIG: &str = r#"
name: Lobby Kiosk
panel_id: lobby
pin: "1234"
destinations:
  - label: Alpha
    url: https://a.example
  - label: Beta
    url: https://b.example
"#;

/// Get the binary to test
fn kiosk_cmd() -> Command {
    let mut cmd = Command::cargo_bin("kiosk-controls").unwrap();
    cmd.env_remove("KIOSK_PIN");
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn test_help_flag() {
    kiosk_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("kiosk mode controller"))
        .stdout(predicate::str::contains("simulate"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_valid_config() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, CONFIG);

    kiosk_cmd()
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("Destinations: 2"))
        .stdout(predicate::str::contains("PIN unlock: on"));
}

#[test]
fn test_validate_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.yaml");

    kiosk_cmd()
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("KIOSK-002"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_validate_duplicate_destinations() {
    let temp = TempDir::new().unwrap();
    let path = write_config(
        &temp,
        r#"
destinations:
  - label: One
    url: https://a.example/path
  - label: Two
    url: "https://a.example/%70ath"
"#,
    );

    kiosk_cmd()
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KIOSK-003"));
}

#[test]
fn test_validate_bad_pin() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, &CONFIG.replace("\"1234\"", "\"12\""));

    kiosk_cmd()
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KIOSK-006"));
}

// ============================================================================
// panel
// ============================================================================

#[test]
fn test_panel_prints_xml() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, CONFIG);

    kiosk_cmd()
        .args(["panel", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<Extensions><Panel>"))
        .stdout(predicate::str::contains("<WidgetId>lobby-siteGroup</WidgetId>"))
        .stdout(predicate::str::contains("<Name>Beta</Name>"))
        .stdout(predicate::str::contains("Enable Kiosk Mode"));
}

#[test]
fn test_panel_enabled_label() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, CONFIG);

    kiosk_cmd()
        .args(["panel", path.to_str().unwrap(), "--enabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Disable Kiosk Mode"));
}

// ============================================================================
// simulate
// ============================================================================

#[test]
fn test_simulate_without_script() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, CONFIG);

    kiosk_cmd()
        .args([
            "simulate",
            path.to_str().unwrap(),
            "--url",
            "https://a.example?x=1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode: Off"))
        .stdout(predicate::str::contains("Selected: 1"))
        .stdout(predicate::str::contains("\"type\": \"synced\""));
}

#[test]
fn test_simulate_script_selects_and_enables() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, CONFIG);
    let script = temp.path().join("events.jsonl");
    fs::write(
        &script,
        r#"{"event":"WidgetAction","widget_id":"lobby-siteGroup","action":"pressed","value":"2"}
{"event":"WidgetAction","widget_id":"lobby-toggle","action":"clicked"}
{"event":"PanelClicked","panel_id":"camera_presets"}
"#,
    )
    .unwrap();

    kiosk_cmd()
        .args([
            "simulate",
            path.to_str().unwrap(),
            "--script",
            script.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode: On"))
        .stdout(predicate::str::contains("URL: https://b.example"))
        .stdout(predicate::str::contains("Selected: 2"))
        .stdout(predicate::str::contains("\"type\": \"url_requested\""))
        .stdout(predicate::str::contains("\"type\": \"event_ignored\""));
}

#[test]
fn test_simulate_empty_url_asks_first() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, CONFIG);
    let script = temp.path().join("events.jsonl");
    fs::write(
        &script,
        r#"{"event":"MessageSend","text":"EnableKiosk"}
"#,
    )
    .unwrap();

    kiosk_cmd()
        .args([
            "simulate",
            path.to_str().unwrap(),
            "-s",
            script.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode: Off"))
        .stdout(predicate::str::contains("\"kind\": \"no_url_warning\""));
}

#[test]
fn test_simulate_malformed_script() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, CONFIG);
    let script = temp.path().join("events.jsonl");
    fs::write(&script, "{\"event\":\"Nope\"}\n").unwrap();

    kiosk_cmd()
        .args([
            "simulate",
            path.to_str().unwrap(),
            "--script",
            script.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KIOSK-092"));
}
