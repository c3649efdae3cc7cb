use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn put_then_get_within_one_transaction_round_trips() {
    let mut cmd = Command::cargo_bin("kvcli").unwrap();
    cmd.arg("--non-interactive")
        .arg(format!("--query={}", "BEGIN\nPUT greeting hello\nGET greeting\nCOMMIT"));

    cmd.assert().success().stdout(predicate::str::contains("hello")).stdout(predicate::str::contains("OK committed"));
}

#[test]
fn get_of_an_absent_key_reports_not_available() {
    let mut cmd = Command::cargo_bin("kvcli").unwrap();
    cmd.arg("--non-interactive").arg(format!("--query={}", "BEGIN\nGET never-written\nCOMMIT"));

    cmd.assert().success().stdout(predicate::str::contains("N/A"));
}

#[test]
fn an_unknown_command_fails_cleanly_with_a_readable_message() {
    let mut cmd = Command::cargo_bin("kvcli").unwrap();
    cmd.arg("--non-interactive").arg(format!("--query={}", "BOGUS"));

    cmd.assert().failure().stderr(predicate::str::contains("unknown command"));
}
