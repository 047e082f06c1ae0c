//! End-to-end tests for the `overlord ls` command.

mod common;
use common::prelude::*;

#[test]
fn test_ls_help() {
    cargo_bin_cmd!("overlord")
        .arg("ls")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("List the projects known"));
}

#[test]
fn test_ls_empty_rootdir() {
    let fixture = TestFixture::new().with_config("");

    fixture
        .overlord("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("No projects in"));
}

#[test]
fn test_ls_lists_subdirectories_of_rootdir() {
    let fixture = TestFixture::new().with_config("");
    fixture.folder("root/alfa-bravo");
    fixture.folder("root/kilo-lima");
    fixture.folder("root/.hidden");

    fixture
        .overlord("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("alfa-bravo\nkilo-lima\n"))
        .stdout(predicate::str::contains(".hidden").not())
        .stdout(predicate::str::contains("2 project(s)"));
}

#[test]
fn test_ls_long_marks_unknown_backend() {
    let fixture = TestFixture::new().with_config("");
    fixture.folder("root/alfa-bravo");

    fixture
        .overlord("ls")
        .arg("--long")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"alfa-bravo\s+-\s+-\s+-").unwrap());
}

#[test]
fn test_ls_json() {
    let fixture = TestFixture::new().with_config("");
    fixture.folder("root/alfa-bravo");

    let output = fixture.overlord("ls").arg("--json").output().unwrap();
    assert!(output.status.success());
    let projects: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(projects[0]["name"], "alfa-bravo");
    assert!(projects[0]["vcs"].is_null());
}

#[test]
fn test_ls_without_config_uses_command_line_settings() {
    let fixture = TestFixture::new();
    fixture.folder("root/alfa-bravo");

    cargo_bin_cmd!("overlord")
        .env_remove("OVERLORD_CONFIG")
        .arg("ls")
        .arg("--name")
        .arg("test")
        .arg("--rootdir")
        .arg(fixture.rootdir())
        .assert()
        .success()
        .stdout(predicate::str::contains("alfa-bravo"));
}
