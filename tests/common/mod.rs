//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

/// Helper to get a bdt command
pub fn bdt() -> Command {
    Command::new(cargo::cargo_bin!("bdt"))
}

/// Helper to create a test project in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    bdt().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Helper to create a test session, returning its full entity ID
pub fn create_test_session(tmp: &TempDir, title: &str) -> String {
    let output = bdt()
        .current_dir(tmp.path())
        .args(["session", "new", "--title", title, "--no-edit", "--output", "id"])
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find(|l| l.starts_with("SES-"))
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}

/// Helper to record one measurement point on the newest session
pub fn add_point(tmp: &TempDir, target: f64, fan: f64, ring: &str) {
    bdt()
        .current_dir(tmp.path())
        .args([
            "point",
            "add",
            "--target",
            &target.to_string(),
            "--fan",
            &fan.to_string(),
            "--ring",
            ring,
        ])
        .assert()
        .success();
}

/// Helper to record the standard five-point open-ring sweep used by the
/// calculation tests (50 down to 30 Pa targets)
pub fn add_standard_points(tmp: &TempDir) {
    let readings = [
        (50.0, 45.0),
        (45.0, 40.0),
        (40.0, 35.0),
        (35.0, 30.0),
        (30.0, 25.0),
    ];
    for (target, fan) in readings {
        add_point(tmp, target, fan, "open");
    }
}

/// Helper to set the building volume on the newest session
pub fn set_volume(tmp: &TempDir, volume: f64) {
    bdt()
        .current_dir(tmp.path())
        .args(["building", "set", "--volume", &volume.to_string()])
        .assert()
        .success();
}
