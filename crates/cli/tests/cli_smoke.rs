//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("crucible")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn list_prints_registered_sequences() {
    Command::cargo_bin("crucible")
        .unwrap()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("capability"))
        .stdout(predicate::str::contains("patient_access"))
        .stdout(predicate::str::contains("standalone_launch"));
}

#[test]
fn list_json_is_parseable() {
    let output = Command::cargo_bin("crucible")
        .unwrap()
        .args(["--output", "json", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["sequences"].as_array().unwrap().len(), 3);
}

#[test]
fn malformed_param_is_rejected() {
    Command::cargo_bin("crucible")
        .unwrap()
        .args([
            "run",
            "capability",
            "--server",
            "https://example.test/fhir",
            "--param",
            "not-a-pair",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key=value"));
}
