use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    cargo_bin_cmd!("community")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("posts"))
        .stdout(predicate::str::contains("comments"))
        .stdout(predicate::str::contains("profile"));
}

#[test]
fn test_posts_help_lists_subcommands() {
    cargo_bin_cmd!("community")
        .args(["posts", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("like"))
        .stdout(predicate::str::contains("unlike"));
}

#[test]
fn test_unknown_sort_is_rejected() {
    cargo_bin_cmd!("community")
        .args(["posts", "list", "--sort", "random"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown sort order"));
}
