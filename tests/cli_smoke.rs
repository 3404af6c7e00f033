//! Behavioural smoke tests for the CLI entrypoint.
//!
//! These run the real binary; no provider credentials are present, so every
//! scenario must resolve before the first API call would be made.

use assert_cmd::Command;
use predicates::prelude::*;

fn pdctl() -> Command {
    let mut cmd = Command::cargo_bin("pdctl").expect("binary should be built");
    cmd.env_remove("GCE_PROJECT_ID")
        .env_remove("GCE_ACCESS_TOKEN")
        .env_remove("GCE_API_BASE");
    cmd
}

#[test]
fn help_describes_the_contract() {
    pdctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--state")
                .and(predicate::str::contains("--detach-only"))
                .and(predicate::str::contains("persistent disk")),
        );
}

#[test]
fn missing_name_is_a_usage_error() {
    pdctl()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--name"));
}

#[test]
fn detach_only_without_instance_emits_a_failure_record() {
    pdctl()
        .args(["--name", "pd", "--state", "absent", "--detach-only"])
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("\"changed\":false")
                .and(predicate::str::contains("detach_only requires instance_name")),
        );
}

#[test]
fn missing_configuration_emits_a_failure_record() {
    pdctl()
        .args(["--name", "pd"])
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("\"msg\"").and(predicate::str::contains("\"changed\":false")),
        );
}
