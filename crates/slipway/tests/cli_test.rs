#![allow(deprecated)] // TODO: migrate cargo_bin to cargo_bin_cmd!

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("aurora"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("slipway"));
}

#[test]
fn test_build_help() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.arg("build")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--parallel"))
        .stdout(predicate::str::contains("--container"))
        .stdout(predicate::str::contains("--push"))
        .stdout(predicate::str::contains("--silent"));
}

#[test]
fn test_build_rejects_zero_parallel() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.args(["build", "--parallel", "0"]).assert().failure();
}

#[test]
fn test_build_fails_without_manifest() {
    let project = TestProject::new();
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.current_dir(project.root.path())
        .args(["build", "--manifest", "missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Manifest not readable"));
}

#[test]
fn test_build_runs_manifest_units() {
    let project = TestProject::new();
    let manifest = project.write_manifest(
        "namespace: acme\ncontainers:\n  - name: api\n    path: services/api\n",
    );
    let stub = project.write_stub_docker("");

    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.env("SLIPWAY_DOCKER", &stub)
        .args(["build", "--silent", "--manifest"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Done"));

    let calls = project.invocations();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("--tag=acme/api:latest"));
}

#[test]
fn test_build_failure_propagates_exit_code() {
    let project = TestProject::new();
    let manifest =
        project.write_manifest("containers:\n  - name: api\n    path: services/api\n");
    let stub = project.write_stub_docker("exit 7");

    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.env("SLIPWAY_DOCKER", &stub)
        .args(["build", "--silent", "--manifest"])
        .arg(&manifest)
        .assert()
        .code(7);
}

#[test]
fn test_container_filter_wins_over_parallel() {
    let project = TestProject::new();
    let manifest = project.write_manifest(
        "containers:\n  - name: api\n    path: a\n  - name: worker\n    path: b\n",
    );
    let stub = project.write_stub_docker("");

    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.env("SLIPWAY_DOCKER", &stub)
        .args([
            "build",
            "--silent",
            "--container",
            "worker",
            "--parallel",
            "4",
            "--manifest",
        ])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| {
            // Announced to the operator once, not echoed again by the
            // scheduler.
            out.matches("ignoring '--parallel'").count() == 1
        }));

    let calls = project.invocations();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("--tag=worker:latest"));
}

#[test]
fn test_build_unknown_container_fails() {
    let project = TestProject::new();
    let manifest =
        project.write_manifest("containers:\n  - name: api\n    path: services/api\n");
    let stub = project.write_stub_docker("");

    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.env("SLIPWAY_DOCKER", &stub)
        .args(["build", "--silent", "--container", "missing", "--manifest"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Container not found"));
}

#[test]
fn test_aurora_help() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.arg("aurora")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("endpoint"));
}

#[test]
fn test_backup_help() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.args(["backup", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--organisation"))
        .stdout(predicate::str::contains("--s3-bucket"))
        .stdout(predicate::str::contains("--daily-retention"))
        .stdout(predicate::str::contains("--sns-topic"));
}

#[test]
fn test_backup_requires_organisation() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.env_remove("ORGANISATION")
        .env_remove("S3_BUCKET")
        .arg("backup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--organisation"));
}

#[test]
fn test_backup_rejects_short_daily_retention() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.env_remove("SNS_TOPIC_ARN");
    cmd.args([
        "backup",
        "--organisation",
        "acme",
        "--s3-bucket",
        "acme-backups",
        "--daily-retention",
        "5",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("at least 30 days"));
}

#[test]
fn test_aurora_requires_aws_cli() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.env("SLIPWAY_AWS", "slipway-no-such-aws")
        .args(["aurora", "endpoint", "staging-db", "eu-west-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("aws CLI not found"));
}

#[test]
fn test_aurora_restore_help_shows_instance_class_default() {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.args(["aurora", "restore", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("db.r4.large"));
}
