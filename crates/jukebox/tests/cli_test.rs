//! Integration tests for the `jukebox` binary.
//!
//! Config handling and short console sessions, run against a throwaway
//! config directory so the user's real configuration is never touched.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `jukebox` binary with env isolation.
fn jukebox_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("jukebox");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("JUKEBOX_CONFIG")
        .env_remove("JUKEBOX_IDLE__INPUT_TIMEOUT")
        .env_remove("JUKEBOX_IDLE__SYSTEM_TIMEOUT")
        .env_remove("JUKEBOX_SHUTDOWN__ALLOW_SHUTDOWN")
        .env_remove("JUKEBOX_VOLUME__INITIAL");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = jukebox_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    jukebox_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("run").and(predicate::str::contains("config")),
    );
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("custom.toml");
    jukebox_cmd(home.path())
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_show_defaults_without_file() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("missing.toml");
    jukebox_cmd(home.path())
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("input_timeout = \"1m\"")
                .and(predicate::str::contains("allow_shutdown = true")),
        );
}

#[test]
fn test_config_show_applies_env_override() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("missing.toml");
    jukebox_cmd(home.path())
        .env("JUKEBOX_SHUTDOWN__ALLOW_SHUTDOWN", "false")
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("allow_shutdown = false"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("jukebox.toml");

    jukebox_cmd(home.path())
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    let output = jukebox_cmd(home.path())
        .args(["config", "init", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--force"));

    jukebox_cmd(home.path())
        .args(["config", "init", "--force", "--config"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_invalid_config_exits_with_config_code() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("jukebox.toml");
    std::fs::write(&path, "[volume]\nstep = 0\n").unwrap();

    let output = jukebox_cmd(home.path())
        .args(["run", "--config"])
        .arg(&path)
        .write_stdin("quit\n")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("volume.step"));
}

// ── Console sessions ────────────────────────────────────────────────

#[test]
fn test_run_session_echoes_tags_and_quits() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("missing.toml");
    jukebox_cmd(home.path())
        .args(["run", "--config"])
        .arg(&path)
        .write_stdin("tag 04:a1:b2:c3\nquit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("jukebox ready")
                .and(predicate::str::contains("modal Player"))
                .and(predicate::str::contains("tag 04A1B2C3"))
                .and(predicate::str::contains("shutting down (Application)")),
        );
}

#[test]
fn test_run_session_ends_on_eof() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("missing.toml");
    jukebox_cmd(home.path())
        .args(["run", "--config"])
        .arg(&path)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("shutting down"));
}

#[test]
fn test_power_button_is_aborted_when_shutdown_disallowed() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("missing.toml");
    jukebox_cmd(home.path())
        .args(["run", "--allow-shutdown", "false", "--config"])
        .arg(&path)
        .write_stdin("power\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("power-off sequence aborted")
                .and(predicate::str::contains("shutting down (PowerControl)")),
        );
}
