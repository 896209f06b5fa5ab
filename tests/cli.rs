// tap-pretty renders nested TAP read from stdin or a file.

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

const PASSING: &str = "TAP version 13
# Subtest: FOO
    ok 1 - should be equivalent
    1..1
ok 1 - FOO
1..1
";

const FAILING: &str = "TAP version 13
# Subtest: FOO
    not ok 1 - foo error
      ---
      found:
        name: Error
        stack: foo error
      ...
    1..1
    # failed 1 test
not ok 1 - FOO
1..1
# failed 1 test
";

#[test]
fn passing_stream_exits_cleanly() {
    Command::cargo_bin("tap-pretty")
        .unwrap()
        .arg("--no-color")
        .write_stdin(PASSING)
        .assert()
        .success()
        .stdout(contains("FOO").and(contains("✔ should be equivalent")))
        .stdout(contains("passing:   1"));
}

#[test]
fn failing_stream_exits_with_failure() {
    Command::cargo_bin("tap-pretty")
        .unwrap()
        .arg("--no-color")
        .write_stdin(FAILING)
        .assert()
        .failure()
        .stdout(contains("✖ foo error").and(contains("failing:   1")));
}

#[test]
fn missing_input_file_is_a_diagnostic() {
    Command::cargo_bin("tap-pretty")
        .unwrap()
        .arg("does/not/exist.tap")
        .assert()
        .failure()
        .stderr(contains("could not open"));
}
