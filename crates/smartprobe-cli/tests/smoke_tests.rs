//! Smoke tests for the smartprobe CLI

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the smartprobe binary
fn smartprobe() -> Command {
    let mut cmd = Command::cargo_bin("smartprobe").expect("smartprobe binary should exist");
    for key in [
        "SMARTPROBE_BASE_URL",
        "SMARTPROBE_BROWSER",
        "SMARTPROBE_HEADLESS",
        "SMARTPROBE_LOG_LEVEL",
        "SMARTPROBE_MAX_LOCATOR_RETRIES",
        "SMARTPROBE_LOCATOR_TIMEOUT_MS",
        "SMARTPROBE_SCREENSHOT_ON_FAILURE",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    smartprobe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    smartprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("strategies"));
}

#[test]
fn test_no_args_fails() {
    smartprobe().assert().failure();
}

#[test]
fn test_probe_subcommand_help() {
    smartprobe()
        .args(["probe", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--xpath"))
        .stdout(predicate::str::contains("--test-id"));
}

// ============================================================================
// strategies / config
// ============================================================================

#[test]
fn test_strategies_lists_tags() {
    smartprobe()
        .arg("strategies")
        .assert()
        .success()
        .stdout(predicate::str::contains("xpath"))
        .stdout(predicate::str::contains("alt_text"));
}

#[test]
fn test_config_yaml_by_default() {
    smartprobe()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://www.ebay.com"))
        .stdout(predicate::str::contains("max_locator_retries: 3"));
}

#[test]
fn test_config_json() {
    let output = smartprobe().args(["config", "--format", "json"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["locator"]["locator_timeout_ms"], 5000);
}

#[test]
fn test_config_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("settings.yaml");
    fs::write(
        &path,
        "base_url: https://shop.test\ncart:\n  verification: require-confirmation\n",
    )
    .unwrap();

    smartprobe()
        .args(["--config", path.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://shop.test"))
        .stdout(predicate::str::contains("require-confirmation"));
}

#[test]
fn test_env_override() {
    smartprobe()
        .env("SMARTPROBE_MAX_LOCATOR_RETRIES", "5")
        .args(["config", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_locator_retries\": 5"));
}

#[test]
fn test_invalid_settings_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("settings.yaml");
    fs::write(&path, "locator:\n  locator_timeout_ms: 0\n").unwrap();

    smartprobe()
        .args(["--config", path.to_str().unwrap(), "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// probe / run
// ============================================================================

#[test]
fn test_probe_without_strategies_fails() {
    smartprobe()
        .args(["probe", "--url", "https://www.ebay.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one"));
}

#[cfg(not(feature = "browser"))]
#[test]
fn test_probe_needs_browser_feature() {
    smartprobe()
        .args(["probe", "--url", "https://www.ebay.com", "--css", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--features browser"));
}

#[test]
fn test_run_rejects_missing_scenario() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("runs.yaml");
    fs::write(
        &path,
        "test_data:\n  - search_query: shoes\n    max_price: 220.0\n    limit: 5\n",
    )
    .unwrap();

    smartprobe()
        .args(["run", "--scenario", "4", "--data", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}
