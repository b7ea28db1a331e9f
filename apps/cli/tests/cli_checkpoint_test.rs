//! Integration tests for the `cadence checkpoint` and `cadence config` commands.

use assert_cmd::Command;
use cadence_training::{read_checkpoint, write_checkpoint, Checkpoint, ParameterSet, Tensor};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Helper to write a checkpoint with the given parameters
fn write_fixture(path: &Path, iteration: u64, params: &[(&str, &[usize], f32)]) {
    let model: ParameterSet = params.iter().map(|(n, s, v)| ((*n).to_string(), Tensor::full(s, *v).unwrap())).collect();
    let ckpt = Checkpoint {
        model,
        iteration,
        learning_rate: 1e-4,
        optimizer: Some(serde_json::json!({"step": iteration})),
    };
    write_checkpoint(&ckpt, path).unwrap();
}

#[test]
fn test_inspect_missing_checkpoint() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("checkpoint")
        .arg("inspect")
        .arg(temp_dir.path().join("G_1.pth"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("checkpoint not found"));
}

#[test]
fn test_inspect_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("G_400.pth");
    write_fixture(&path, 400, &[("enc_p.proj.weight", &[4, 2], 0.5), ("enc_p.proj.bias", &[4], 0.0)]);

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    let output = cmd.arg("checkpoint").arg("inspect").arg(&path).arg("--json").output().unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["iteration"], 400);
    assert_eq!(value["numel"], 12);
    assert_eq!(value["has_optimizer"], true);
    assert_eq!(value["parameters"]["enc_p.proj.weight"], serde_json::json!([4, 2]));
}

#[test]
fn test_inspect_human_output() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("G_7.pth");
    write_fixture(&path, 7, &[("dec.ups.0.weight", &[2, 2], 1.0)]);

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("checkpoint")
        .arg("inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("dec.ups.0.weight"))
        .stdout(predicate::str::contains("Iteration:     7"));
}

#[test]
fn test_restore_reconciles_into_target_layout() {
    let temp_dir = TempDir::new().unwrap();
    let from = temp_dir.path().join("pretrained.pth");
    let into = temp_dir.path().join("G_0.pth");
    let output = temp_dir.path().join("out").join("G_0.pth");

    write_fixture(&from, 90_000, &[("w", &[3, 3], 1.0), ("b", &[4], 1.0), ("old", &[1], 1.0)]);
    write_fixture(&into, 0, &[("w", &[3, 3], 0.0), ("b", &[3], 0.0), ("new", &[2], 0.0)]);

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("checkpoint")
        .arg("restore")
        .arg("--from")
        .arg(&from)
        .arg("--into")
        .arg(&into)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded:    1/3"));

    let restored = read_checkpoint(&output).unwrap();
    assert_eq!(restored.iteration, 0);
    assert_eq!(restored.model.len(), 3);
    assert_eq!(restored.model.get("w").unwrap().data(), &[1.0; 9]);
    assert_eq!(restored.model.get("b").unwrap().data(), &[0.0; 3]);
    assert!(!restored.model.contains("old"));
    assert_eq!(restored.optimizer, Some(serde_json::json!({"step": 0})));
}

#[test]
fn test_restore_json_report() {
    let temp_dir = TempDir::new().unwrap();
    let from = temp_dir.path().join("a.pth");
    let into = temp_dir.path().join("b.pth");
    let output = temp_dir.path().join("c.pth");
    write_fixture(&from, 1, &[("w", &[2], 1.0)]);
    write_fixture(&into, 2, &[("w", &[3], 0.0)]);

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    let out = cmd
        .args(["checkpoint", "restore", "--json", "--from"])
        .arg(&from)
        .arg("--into")
        .arg(&into)
        .arg("--output")
        .arg(&output)
        .output()
        .unwrap();

    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["report"]["outcomes"][0][0], "w");
    assert_eq!(value["report"]["outcomes"][0][1]["outcome"], "shape_mismatch");
    assert_eq!(value["sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn test_config_prepares_stage_directory() {
    let temp_dir = TempDir::new().unwrap();
    let s1 = temp_dir.path().join("logs_s1");
    let config = temp_dir.path().join("config.json");
    let text = serde_json::json!({
        "train": {"batch_size": 8},
        "s1_ckpt_dir": &s1,
        "s2_ckpt_dir": temp_dir.path().join("logs_s2")
    });
    std::fs::write(&config, text.to_string()).unwrap();

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    let output = cmd.arg("config").arg("--config").arg(&config).args(["--resume-step", "300"]).output().unwrap();

    assert!(output.status.success());
    assert!(s1.join("config.json").exists());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["resume_step"], 300);
    assert_eq!(value["pretrain"], serde_json::Value::Null);
    assert_eq!(value["train"]["batch_size"], 8);
}

#[test]
fn test_config_rejects_unknown_stage() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.json");
    std::fs::write(&config, "{}").unwrap();

    let mut cmd = Command::cargo_bin("cadence").unwrap();
    cmd.arg("config")
        .arg("--config")
        .arg(&config)
        .args(["--stage", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown training stage"));
}
