#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const BUNDLED: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../topologies/redis-setup.kdl"
);

fn topo() -> Command {
    let mut cmd = Command::cargo_bin("topo").unwrap();
    cmd.env_remove("TOPOFLOW_CONFIG_PATH")
        .env_remove("TOPOFLOW_PROJECT_ROOT")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_help() {
    topo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("outputs"));
}

#[test]
fn test_cli_version() {
    topo()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("topoflow"));
}

#[test]
fn test_invalid_command() {
    topo().arg("invalid-command").assert().failure();
}

#[test]
fn test_file_conflicts_with_builtin() {
    topo()
        .args(["validate", "--builtin", "--file", BUNDLED])
        .assert()
        .failure();
}

#[test]
fn test_validate_builtin() {
    topo()
        .args(["validate", "--builtin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ トポロジーは正常です"))
        .stdout(predicate::str::contains("redis-setup"))
        .stdout(predicate::str::contains("10.0.3.0/24"))
        .stdout(predicate::str::contains("インスタンス: 7個"));
}

#[test]
fn test_validate_bundled_file() {
    topo()
        .args(["validate", "--file", BUNDLED])
        .assert()
        .success()
        .stdout(predicate::str::contains("redis-secgrp"))
        .stdout(predicate::str::contains("出力: 21個"));
}

#[test]
fn test_validate_discovers_file_in_cwd() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(BUNDLED, dir.path().join("topology.kdl")).unwrap();

    topo()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("topology.kdl"));
}

#[test]
fn test_validate_falls_back_to_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    topo()
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .arg("validate")
        .assert()
        .success()
        .stderr(predicate::str::contains("組み込みトポロジー"))
        .stdout(predicate::str::contains("builtin (redis-setup)"));
}

#[test]
fn test_validate_rejects_overlapping_subnets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("topology.kdl");
    fs::write(
        &path,
        r#"
        topology "broken" {
            region "ap-southeast-1"
            network "vpc" { cidr "10.0.0.0/16"; }
            subnet "a" { network "vpc"; cidr "10.0.1.0/24"; zone "ap-southeast-1a"; }
            subnet "b" { network "vpc"; cidr "10.0.1.128/25"; zone "ap-southeast-1a"; }
        }
        "#,
    )
    .unwrap();

    topo()
        .args(["validate", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("✗ トポロジーエラー"))
        .stderr(predicate::str::contains("重複しています"));
}

#[test]
fn test_validate_reports_unassociated_subnet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("topology.kdl");
    fs::write(
        &path,
        r#"
        topology "loose" {
            region "ap-southeast-1"
            network "vpc" { cidr "10.0.0.0/16"; }
            subnet "a" { network "vpc"; cidr "10.0.1.0/24"; zone "ap-southeast-1a"; }
        }
        "#,
    )
    .unwrap();

    topo()
        .args(["validate", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "サブネット 'a' にルートテーブルが関連付けられていません",
        ));
}

#[test]
fn test_render_builtin_to_stdout() {
    let output = topo().args(["render", "--builtin"]).output().unwrap();
    assert!(output.status.success());

    let set: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(set["topology"], "redis-setup");
    assert_eq!(set["resources"].as_array().unwrap().len(), 18);
    assert_eq!(set["resources"][0]["resource_type"], "aws:ec2/vpc:Vpc");
}

#[test]
fn test_render_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("resources.json");

    topo()
        .args(["render", "--file", BUNDLED, "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("18個のリソース"));

    let content = fs::read_to_string(&out).unwrap();
    let set: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(set["region"], "ap-southeast-1");
}

#[test]
fn test_outputs_pending_without_state() {
    let dir = tempfile::tempdir().unwrap();

    topo()
        .args(["outputs", "--builtin", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("vpcId"))
        .stdout(predicate::str::contains("未解決"));
}

#[test]
fn test_outputs_json_requires_state() {
    let dir = tempfile::tempdir().unwrap();

    topo()
        .args(["outputs", "--builtin", "--json", "--project-root"])
        .arg(dir.path())
        .assert()
        .failure();
}

#[test]
fn test_outputs_resolved_from_state() {
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join(".topoflow");
    fs::create_dir(&state_dir).unwrap();
    fs::write(
        state_dir.join("state.json"),
        r#"{
            "version": 1,
            "updated_at": "2026-01-01T00:00:00Z",
            "resources": {
                "network:redis-vpc": {
                    "id": "vpc-0123",
                    "resource_type": "aws:ec2/vpc:Vpc",
                    "status": "available",
                    "created_at": "2026-01-01T00:00:00Z",
                    "updated_at": "2026-01-01T00:00:00Z"
                }
            }
        }"#,
    )
    .unwrap();

    topo()
        .args(["outputs", "--builtin", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("vpc-0123"));
}
