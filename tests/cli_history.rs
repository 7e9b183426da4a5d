//! End-to-end tests for the `chatty history` commands

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn chatty(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("chatty").unwrap();
    cmd.env_remove("CHATTY_HISTORY_DB")
        .env_remove("CHATTY_LIST_LIMIT")
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(dir.path().join("missing.yaml"))
        .arg("--storage-path")
        .arg(dir.path().join("db").join("chatty.db"));
    cmd
}

#[test]
fn test_history_list_empty_store() {
    let dir = TempDir::new().unwrap();
    chatty(&dir)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No conversation history found."));
}

#[test]
fn test_history_conversation_flow() {
    let dir = TempDir::new().unwrap();

    chatty(&dir)
        .args(["history", "new", "Trip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created session 1"));

    chatty(&dir)
        .args(["history", "append", "1", "--content", "hi"])
        .assert()
        .success();
    chatty(&dir)
        .args(["history", "append", "1", "--role", "assistant", "--content", "hello"])
        .assert()
        .success();

    let output = chatty(&dir)
        .args(["history", "show", "1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let transcript: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(transcript["summary"]["name"], "Trip");
    assert_eq!(transcript["summary"]["message_count"], 2);
    assert_eq!(transcript["messages"][0]["role"], "user");
    assert_eq!(transcript["messages"][0]["content"], "hi");
    assert_eq!(transcript["messages"][1]["role"], "assistant");
    assert_eq!(transcript["messages"][1]["content"], "hello");

    chatty(&dir)
        .args(["history", "rename", "1", "Holiday"])
        .assert()
        .success();
    chatty(&dir)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Holiday"));

    chatty(&dir)
        .args(["history", "delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted session 1"));
    chatty(&dir)
        .args(["history", "show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such session 1"));
}

#[test]
fn test_history_append_to_missing_session_fails() {
    let dir = TempDir::new().unwrap();
    chatty(&dir)
        .args(["history", "append", "42", "--content", "orphan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such session 42"));
}

#[test]
fn test_history_rename_rejects_blank_name() {
    let dir = TempDir::new().unwrap();
    chatty(&dir).args(["history", "new"]).assert().success();
    chatty(&dir)
        .args(["history", "rename", "1", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("session name cannot be empty"));
}

#[test]
fn test_history_requires_subcommand() {
    let dir = TempDir::new().unwrap();
    chatty(&dir).arg("history").assert().failure();
}
