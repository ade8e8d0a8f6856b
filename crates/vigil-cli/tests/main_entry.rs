//! Integration tests for the `vigil` binary entry point.
//!
//! Exercises argument parsing, the real configuration loader and the
//! user-facing error reporting without a running supervisor.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("vigil.toml");
    fs::write(&path, body).expect("write configuration file");
    path
}

#[test]
fn help_succeeds() {
    let mut command = cargo_bin_cmd!("vigil");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("Usage: vigil"));
}

#[test]
fn missing_service_name_exits_with_failure() {
    let mut command = cargo_bin_cmd!("vigil");
    command.arg("start");
    command
        .assert()
        .failure()
        .stderr(contains("<NAME>"));
}

#[test]
fn empty_host_in_configuration_file_is_rejected() {
    let dir = TempDir::new().expect("temporary directory");
    let path = write_config(&dir, "monit_host = \"\"\n");
    let mut command = cargo_bin_cmd!("vigil");
    command.env_remove("VIGIL_MONIT_HOST");
    command.arg("--config-path").arg(&path).arg("status");
    command
        .assert()
        .failure()
        .stderr(contains("monit_host must not be empty"));
}

#[test]
fn malformed_host_is_rejected_before_connecting() {
    let dir = TempDir::new().expect("temporary directory");
    let path = write_config(&dir, "monit_host = \"agent/../admin\"\n");
    let mut command = cargo_bin_cmd!("vigil");
    command.env_remove("VIGIL_MONIT_HOST");
    command.arg("--config-path").arg(&path).args(["start", "nats"]);
    command
        .assert()
        .failure()
        .stderr(contains("invalid supervisor host"));
}
