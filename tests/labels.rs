mod common;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::str::contains;

fn labels_cmd(workspace: &TestWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("csv-ndjson").expect("binary exists");
    cmd.current_dir(workspace.path()).arg("labels");
    cmd
}

#[test]
fn counts_event_types_from_default_pattern() {
    let workspace = TestWorkspace::new();
    workspace.write(
        "a/unknown1.log",
        "{\"event_type\":\"login\"}\n{\"event_type\":\"logout\"}\n",
    );
    workspace.write("b/unknown2.log", "\n{\"event_type\":\"login\"}\n");
    workspace.write("b/known.log", "{\"event_type\":\"ignored\"}\n");

    let assert = labels_cmd(&workspace).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8 stdout");
    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "event_type  count");
    assert_eq!(lines[2], "logout          1");
    assert_eq!(lines[3], "login           2");
    assert!(!stdout.contains("ignored"));
}

#[test]
fn explicit_paths_override_pattern() {
    let workspace = TestWorkspace::new();
    let log = workspace.write("events.log", "{\"event_type\":\"signup\"}\n");

    labels_cmd(&workspace)
        .arg(log.to_str().unwrap())
        .assert()
        .success()
        .stdout(contains("signup"));
}

#[test]
fn custom_pattern_is_honoured() {
    let workspace = TestWorkspace::new();
    workspace.write("logs/odd.log", "{\"event_type\":\"purge\"}\n");

    labels_cmd(&workspace)
        .args(["--pattern", "logs/*.log"])
        .assert()
        .success()
        .stdout(contains("purge"));
}

#[test]
fn no_matching_files_prints_empty_table() {
    let workspace = TestWorkspace::new();

    let assert = labels_cmd(&workspace).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8 stdout");
    assert_eq!(stdout.lines().count(), 2);
}

#[test]
fn malformed_line_fails_with_location() {
    let workspace = TestWorkspace::new();
    workspace.write(
        "a/unknown1.log",
        "{\"event_type\":\"login\"}\n{not json}\n",
    );

    labels_cmd(&workspace)
        .assert()
        .failure()
        .stderr(contains("unknown1.log at line 2"));
}
