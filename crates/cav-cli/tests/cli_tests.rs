//! End-to-end tests of the `cav` binary.
//!
//! Every run uses `--instant` so no test waits on wall-clock time.

#![allow(deprecated)] // cargo_bin deprecation

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn cav() -> Command {
    let mut cmd = Command::cargo_bin("cav").unwrap();
    cmd.env_remove("CAV_CONFIG")
        .env_remove("CAV_VERIFY_STEP")
        .env_remove("CAV_VERIFY_PERIOD_MS")
        .env_remove("CAV_REGISTER_STEP")
        .env_remove("CAV_REGISTER_PERIOD_MS")
        .env_remove("CAV_HASH_MODE")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn is_hex_hash(value: &serde_json::Value) -> bool {
    value
        .as_str()
        .and_then(|s| s.strip_prefix("0x"))
        .is_some_and(|h| h.len() == 64 && h.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')))
}

// === verify ===

#[test]
fn test_verify_prints_result_json() {
    let output = cav()
        .args(["verify", "img1", "--instant", "--seed", "7"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "verification");
    let score = json["authenticityScore"].as_f64().unwrap();
    assert!((0.6..=1.0).contains(&score));
    assert!(is_hex_hash(&json["contentHash"]));
    assert_eq!(json["signals"].as_array().map(Vec::len), Some(8));
}

#[test]
fn test_verify_reports_progress_on_stderr() {
    cav()
        .args(["verify", "img1", "--instant"])
        .assert()
        .success()
        .stderr(predicate::str::contains("verification:  10%"))
        .stderr(predicate::str::contains("verification: 100%"))
        .stderr(predicate::str::contains("verification: complete"));
}

#[test]
fn test_quiet_suppresses_progress() {
    cav()
        .args(["verify", "img1", "--instant", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::contains("%").not());
}

#[test]
fn test_verify_without_content_is_input_error() {
    cav()
        .args(["verify", "--instant"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no content selected"));
}

#[test]
fn test_digest_hash_is_stable_across_runs() {
    let run = || {
        let output = cav()
            .args(["verify", "img1", "--instant", "--quiet"])
            .output()
            .unwrap();
        stdout_json(&output)["contentHash"].clone()
    };
    assert_eq!(run(), run());
}

// === register ===

#[test]
fn test_register_simulated_network() {
    let output = cav()
        .args([
            "register", "img1", "--creator", "Alice", "--email", "a@b.com", "--network",
            "polygon", "--instant",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "registration");
    assert_eq!(json["status"], "confirmed");
    assert_eq!(json["network"], "polygon");
    assert_eq!(json["creatorName"], "Alice");
    assert!(json["blockNumber"].as_u64().unwrap() > 0);
    assert!(is_hex_hash(&json["transactionHash"]));
}

#[test]
fn test_register_missing_fields() {
    cav()
        .args(["register", "img1", "--email", "a@b.com", "--instant"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing required fields: creatorName"));
}

#[test]
fn test_register_unknown_network_fails() {
    cav()
        .args([
            "register", "img1", "--creator", "Alice", "--email", "a@b.com", "--network",
            "dogechain", "--instant",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown network"));
}

#[test]
fn test_register_on_local_ledger() {
    let output = cav()
        .args([
            "register", "img1", "--creator", "Alice", "--email", "a@b.com", "--ledger",
            "--instant",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["network"], "local");
    assert_eq!(json["fee"], "0.000000");
    assert_eq!(json["blockNumber"], 1);
}

#[test]
fn test_ledger_conflicts_with_network() {
    cav()
        .args(["register", "img1", "--ledger", "--network", "polygon"])
        .assert()
        .failure();
}

// === config ===

#[test]
fn test_config_file_changes_cadence() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "verification: {{ step: 50, period_ms: 10 }}").unwrap();

    cav()
        .args(["verify", "img1", "--instant", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("verification:  50%"))
        .stderr(predicate::str::contains("verification:  10%").not());
}

#[test]
fn test_invalid_config_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "registration: {{ step: 0, period_ms: 100 }}").unwrap();

    cav()
        .args(["verify", "img1", "--instant", "--config"])
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CONFIG/"));
}

#[test]
fn test_env_override_applies() {
    cav()
        .env("CAV_VERIFY_STEP", "25")
        .args(["verify", "img1", "--instant"])
        .assert()
        .success()
        .stderr(predicate::str::contains("verification:  75%"));
}

#[test]
fn test_random_hash_mode_from_env() {
    let run = || {
        let output = cav()
            .env("CAV_HASH_MODE", "random")
            .args(["verify", "img1", "--instant", "--quiet"])
            .output()
            .unwrap();
        stdout_json(&output)["contentHash"].clone()
    };
    assert_ne!(run(), run());
}

#[test]
fn test_missing_subcommand_shows_usage() {
    cav()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
