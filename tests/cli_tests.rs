//! CLI integration tests for the `ecpp` binary.
//!
//! Exercises the compiled binary end to end via `assert_cmd`: argument
//! parsing, and the `is-prob-prime` / `is-prime` / `prove` / `factor` /
//! `verify-proof` subcommands against known small values.

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn ecpp() -> Command {
    Command::cargo_bin("ecpp").unwrap()
}

#[test]
fn help_shows_all_subcommands() {
    ecpp().arg("--help").assert().success().stdout(
        predicate::str::contains("is-prob-prime")
            .and(predicate::str::contains("is-prime"))
            .and(predicate::str::contains("prove"))
            .and(predicate::str::contains("verify-proof"))
            .and(predicate::str::contains("factor")),
    );
}

#[test]
fn is_prob_prime_reports_prime() {
    ecpp()
        .args(["is-prob-prime", "97"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prime"));
}

#[test]
fn is_prob_prime_reports_composite() {
    ecpp()
        .args(["is-prob-prime", "91"])
        .assert()
        .success()
        .stdout(predicate::str::contains("composite"));
}

#[test]
fn is_prob_prime_rejects_negative() {
    ecpp().args(["is-prob-prime", "-5"]).assert().failure();
}

#[test]
fn factor_decomposes_primorial() {
    ecpp()
        .args(["factor", "30030"]) // 2*3*5*7*11*13
        .assert()
        .success()
        .stdout(
            predicate::str::contains("2")
                .and(predicate::str::contains("3"))
                .and(predicate::str::contains("5"))
                .and(predicate::str::contains("7"))
                .and(predicate::str::contains("11"))
                .and(predicate::str::contains("13")),
        );
}

#[test]
fn prove_then_verify_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let cert_path = dir.path().join("cert.txt");

    ecpp()
        .args(["prove", "1000003", "--out"])
        .arg(&cert_path)
        .assert()
        .success();

    assert!(cert_path.exists());

    ecpp()
        .args(["verify-proof"])
        .arg(&cert_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn is_prime_small_prime() {
    ecpp()
        .args(["is-prime", "1000003"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prime"));
}
