//! CLI integration tests for sqlite-mysql-migrate.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for various error conditions.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const ENV_VARS: &[&str] = &[
    "SQLITE_DB",
    "MARIADB_HOST",
    "MARIADB_PORT",
    "MARIADB_USER",
    "MARIADB_PASSWORD",
    "MARIADB_DATABASE",
];

/// Get a command for the sqlite-mysql-migrate binary with a clean environment.
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("sqlite-mysql-migrate").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--batch-size"))
        .stdout(predicate::str::contains("--sqlite-path"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sqlite-mysql-migrate"));
}

#[test]
fn test_global_flags_exist() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("--verbosity"));
}

#[test]
fn test_no_subcommand_shows_usage() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_2() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "run", "--dry-run"])
        .assert()
        .code(2);
}

#[test]
fn test_invalid_yaml_exits_with_code_2() {
    let file = config_file("source: [unterminated");
    cmd()
        .args(["--config", file.path().to_str().unwrap(), "run", "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("YAML error"));
}

#[test]
fn test_zero_batch_size_exits_with_code_2() {
    cmd()
        .args(["run", "--dry-run", "--batch-size", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("batch_size"));
}

#[test]
fn test_invalid_port_env_exits_with_code_2() {
    cmd()
        .env("MARIADB_PORT", "not-a-port")
        .args(["run", "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("MARIADB_PORT"));
}

#[test]
fn test_missing_sqlite_file_exits_with_code_3() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.db");
    cmd()
        .args(["run", "--dry-run", "--sqlite-path", missing.to_str().unwrap()])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Cannot connect to SQLite"));
}

#[test]
fn test_health_check_reports_unreachable_stores() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.db");
    let file = config_file(&format!(
        "source:\n  path: {}\ntarget:\n  host: 127.0.0.1\n  port: 1\n",
        missing.display()
    ));
    cmd()
        .args([
            "--config",
            file.path().to_str().unwrap(),
            "--output-json",
            "health-check",
        ])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("\"healthy\": false"))
        .stdout(predicate::str::contains("\"source_connected\": false"));
}
