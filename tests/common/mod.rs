//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get a bare freshline command
pub fn freshline() -> Command {
    Command::new(cargo::cargo_bin!("freshline"))
}

/// A freshline command isolated inside `tmp`
///
/// Runs in `tmp`, keeps history under `tmp/data`, and hides any user config
/// or `FRESHLINE_*` variables from the surrounding environment.
pub fn freshline_in(tmp: &TempDir) -> Command {
    let mut cmd = freshline();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env("XDG_DATA_HOME", tmp.path().join(".local/share"))
        .env_remove("FRESHLINE_USER_ID")
        .env_remove("FRESHLINE_USER_NAME")
        .env_remove("FRESHLINE_HISTORY_CAPACITY")
        .env_remove("FRESHLINE_LOG")
        .env_remove("RUST_LOG")
        .env("FRESHLINE_DATA_DIR", data_dir(tmp));
    cmd
}

/// A freshline command signed in as the test hub manager
pub fn freshline_as_manager(tmp: &TempDir) -> Command {
    let mut cmd = freshline_in(tmp);
    cmd.args(["--user-id", "hub-1", "--user-name", "Hub Manager"]);
    cmd
}

pub fn data_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data")
}

/// Record a change and return its full entry id
pub fn record_change(tmp: &TempDir, action: &str, entity_type: &str, entity_id: &str, before: &str, after: &str) -> String {
    let output = freshline_as_manager(tmp)
        .args([
            "record",
            "--action",
            action,
            "--type",
            entity_type,
            "--id",
            entity_id,
            "--before",
            before,
            "--after",
            after,
            "-o",
            "id",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "record failed: {:?}", output);

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Write a local config file under `tmp/.freshline/config.yaml`
pub fn write_local_config(tmp: &TempDir, yaml: &str) {
    let dir = tmp.path().join(".freshline");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.yaml"), yaml).unwrap();
}
