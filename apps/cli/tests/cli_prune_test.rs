//! Integration tests for the `cadence prune` and `cadence latest` commands.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create empty checkpoint files in a model directory
fn create_checkpoints(temp_dir: &TempDir, names: &[&str]) {
    for name in names {
        fs::write(temp_dir.path().join(name), "{}").unwrap();
    }
}

#[test]
fn test_prune_missing_directory() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("prune")
        .arg(temp_dir.path().join("logs"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_prune_by_index_keeps_newest() {
    let temp_dir = TempDir::new().unwrap();
    create_checkpoints(
        &temp_dir,
        &["G_0.pth", "G_10.pth", "G_20.pth", "G_30.pth", "D_0.pth", "D_10.pth", "D_20.pth"],
    );

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("prune")
        .arg(temp_dir.path())
        .args(["--keep", "2", "--sort", "index"])
        .assert()
        .success()
        .stdout(predicate::str::contains("G_10.pth"))
        .stdout(predicate::str::contains("Removed 1 checkpoints"));

    assert!(!temp_dir.path().join("G_10.pth").exists());
    assert!(temp_dir.path().join("G_0.pth").exists());
    assert!(temp_dir.path().join("D_10.pth").exists());
}

#[test]
fn test_prune_dry_run_keeps_files() {
    let temp_dir = TempDir::new().unwrap();
    create_checkpoints(&temp_dir, &["G_1.pth", "G_2.pth", "G_3.pth"]);

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("prune")
        .arg(temp_dir.path())
        .args(["--keep", "1", "--sort", "index", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would remove"));

    assert!(temp_dir.path().join("G_1.pth").exists());
    assert!(temp_dir.path().join("G_2.pth").exists());
}

#[test]
fn test_prune_repeated_role_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    create_checkpoints(&temp_dir, &["G_1.pth", "G_2.pth", "G_3.pth"]);

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("prune")
        .arg(temp_dir.path())
        .args(["--keep", "1", "--sort", "index", "--roles", "G,G"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 checkpoints"));

    assert!(temp_dir.path().join("G_3.pth").exists());
}

#[test]
fn test_prune_json_output() {
    let temp_dir = TempDir::new().unwrap();
    create_checkpoints(&temp_dir, &["D_5.pth", "D_6.pth", "G_5.pth"]);

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    let output = cmd
        .arg("prune")
        .arg(temp_dir.path())
        .args(["--keep", "1", "--sort", "index", "--roles", "D", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let removed = value["removed"].as_array().unwrap();
    assert_eq!(removed.len(), 1);
    assert!(removed[0].as_str().unwrap().ends_with("D_5.pth"));
    assert!(temp_dir.path().join("G_5.pth").exists());
}

#[test]
fn test_prune_malformed_name_fails_in_index_mode() {
    let temp_dir = TempDir::new().unwrap();
    create_checkpoints(&temp_dir, &["G_1.pth", "G_2.pth", "G_final.pth"]);

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("prune")
        .arg(temp_dir.path())
        .args(["--keep", "1", "--sort", "index"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("G_final.pth"));

    assert!(temp_dir.path().join("G_1.pth").exists());
}

#[test]
fn test_prune_rejects_unknown_sort() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("prune")
        .arg(temp_dir.path())
        .args(["--sort", "size"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown sort order"));
}

#[test]
fn test_latest_prints_highest_step() {
    let temp_dir = TempDir::new().unwrap();
    create_checkpoints(&temp_dir, &["G_900.pth", "G_1200.pth", "D_5000.pth"]);

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("latest")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("G_1200.pth"));
}

#[test]
fn test_latest_empty_directory() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("latest").arg(temp_dir.path()).assert().failure();
}
