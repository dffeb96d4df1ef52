//! CLI end-to-end tests
//!
//! Tests for the clipforged command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[cfg(unix)]
mod common;

/// Get a command for the clipforged binary
#[allow(deprecated)]
fn clipforged_cmd() -> Command {
    let mut cmd = Command::cargo_bin("clipforged").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    clipforged_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    clipforged_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clipforged"))
        .stdout(predicate::str::contains("capture"));
}

#[test]
fn test_cli_version_flag() {
    clipforged_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("clipforged"));
}

#[test]
fn test_cli_sanitize() {
    clipforged_cmd()
        .args(["sanitize", "My Holiday Clip (1).MP4"])
        .assert()
        .success()
        .stdout("my-holiday-clip-1.mp4\n");

    clipforged_cmd()
        .args(["sanitize", "???"])
        .assert()
        .success()
        .stdout("upload\n");
}

#[test]
fn test_cli_validate_defaults() {
    clipforged_cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("Timeout: 600s"));
}

#[test]
fn test_cli_validate_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clipforged.toml");
    std::fs::write(&path, "[tools]\ntimeout_secs = 30\n\n[capture]\non_active = \"reject\"\n")
        .unwrap();

    clipforged_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Timeout: 30s"))
        .stdout(predicate::str::contains("Reject"));
}

#[test]
fn test_cli_validate_rejects_zero_timeout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[tools]\ntimeout_secs = 0\n").unwrap();

    clipforged_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_secs"));
}

#[test]
fn test_cli_run_rejects_other_programs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clipforged.toml");
    std::fs::write(&path, format!("work_dir = {:?}\n", dir.path().join("work"))).unwrap();

    clipforged_cmd()
        .arg("--config")
        .arg(&path)
        .args(["run", "rm -rf /"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Command rejected"))
        .stderr(predicate::str::contains("Only ffmpeg and ffprobe"));
}

#[cfg(unix)]
#[test]
fn test_cli_check_tools_with_fake_tools() {
    let tools = common::FakeTools::new();

    clipforged_cmd()
        .arg("--config")
        .arg(tools.config_file())
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg version 6.1-fake"))
        .stdout(predicate::str::contains("All required tools are available"));
}

#[cfg(unix)]
#[test]
fn test_cli_probe_json() {
    let tools = common::FakeTools::new();
    tools.add_input("clip.mp4");

    let output = clipforged_cmd()
        .arg("--config")
        .arg(tools.config_file())
        .args(["probe", "clip.mp4", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["streams"].as_array().unwrap().len(), 2);
    assert_eq!(json["format"]["duration"], "12.300000");
}

#[cfg(unix)]
#[test]
fn test_cli_exec_reports_envelope() {
    let tools = common::FakeTools::new();
    tools.add_input("in.mp4");

    let output = clipforged_cmd()
        .arg("--config")
        .arg(tools.config_file())
        .args(["--json", "exec", "ffmpeg", "--output", "out.mp4", "-i", "in.mp4", "out.mp4"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["outputFile"], "out.mp4");
    assert!(json.get("error").is_none());
}

#[cfg(unix)]
#[test]
fn test_cli_batch() {
    let tools = common::FakeTools::new();
    tools.add_input("a.mp4");
    tools.add_input("b.mp4");

    clipforged_cmd()
        .arg("--config")
        .arg(tools.config_file())
        .args(["batch", "-i", "a.mp4", "b.mp4", "-o", "{filestem}.webm", "--"])
        .args(["-i", "{input}", "{output}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 item(s), 0 failed"));

    assert!(tools.work_dir.join("a.webm").is_file());
    assert!(tools.work_dir.join("b.webm").is_file());
}
