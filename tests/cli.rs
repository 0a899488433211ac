use assert_cmd::Command;
use predicates::prelude::*;

// These tests only exercise paths that never touch a live engine.

fn ssbench() -> Command {
    Command::cargo_bin("ssbench").unwrap()
}

#[test]
fn print_queries_flat() {
    ssbench()
        .args(["-n", "2.1", "-p", "--limit", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"Bitmap(frame="p_brand1", rowID=40)"#))
        .stdout(predicate::str::contains(r#"Bitmap(frame="p_brand1", rowID=41)"#))
        .stderr(predicate::str::contains("2.1: 280 queries"));
}

#[test]
fn print_queries_limit_zero_prints_all() {
    ssbench()
        .args(["-n", "2.3", "-p", "--limit", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rowID=260").count(7));
}

#[test]
fn print_queries_grouped() {
    ssbench()
        .args(["-n", "3.4", "-g", "-p", "--limit", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"Bitmap(frame="lo_month", rowID=11)"#).count(4))
        .stderr(predicate::str::contains("3.4: 4 cells"));
}

#[test]
fn unknown_family_is_an_error() {
    ssbench()
        .args(["-n", "7.7", "-p"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown family"));
}

#[test]
fn grouped_rejects_flat_only_family() {
    ssbench()
        .args(["-n", "1.1", "-g", "-p"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no grouped form"));
}

#[test]
fn zero_batch_size_is_an_error() {
    ssbench()
        .args(["-n", "2.1", "-b", "0", "-p"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch size"));
}

#[test]
fn version_carries_build_info() {
    ssbench()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ver:"));
}
