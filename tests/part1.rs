use assert_cmd::Command;
use predicates::prelude::predicate::str;

#[test]
fn part1_output_right_answer() {
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.arg("inputs.txt");

    cmd.assert()
        .success()
        .stdout(str::contains("is 94 steps long"));
}

#[test]
fn part1_parallel_output_right_answer() {
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.arg("inputs.txt").arg("--parallel");

    cmd.assert()
        .success()
        .stdout(str::contains("is 94 steps long"));
}

#[test]
fn part1_fails_on_missing_file() {
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.arg("no_such_inputs.txt");

    cmd.assert()
        .failure()
        .stderr(str::contains("Failed to read map"));
}
