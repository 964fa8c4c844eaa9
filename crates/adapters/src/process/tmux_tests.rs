// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use yare::parameterized;
use std::sync::LazyLock;

/// Random prefix for this test run to avoid conflicts with parallel test runs.
static TEST_PREFIX: LazyLock<String> = LazyLock::new(|| {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    format!("bqt{:04x}", nanos & 0xFFFF)
});

/// Check if tmux is available on this system
fn tmux_available() -> bool {
    std::process::Command::new("tmux")
        .arg("-V")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! skip_if_no_tmux {
    () => {
        if !tmux_available() {
            eprintln!("tmux not available, skipping");
            return;
        }
    };
}

fn adapter() -> TmuxProcessAdapter {
    TmuxProcessAdapter::with_prefix(TEST_PREFIX.as_str())
}

async fn wait_done(adapter: &TmuxProcessAdapter, handle: &ProcessHandle) {
    for _ in 0..200 {
        if adapter.is_done(handle).await.unwrap() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("session {handle} did not finish");
}

#[parameterized(
    plain_word = { "hello", "hello" },
    absolute_path = { "/usr/bin/env", "/usr/bin/env" },
    assignment = { "KEY=value", "KEY=value" },
    empty = { "", "''" },
    two_words = { "two words", "'two words'" },
    variable = { "$HOME", "'$HOME'" },
    single_quote = { "it's", r"'it'\''s'" },
)]
fn shell_quote_cases(word: &str, expected: &str) {
    assert_eq!(shell_quote(word), expected);
}

#[test]
fn pane_command_execs_with_redirections() {
    let desc = JobDescription::builder("/bin/echo")
        .args(["hello world", "x"])
        .stdin("/tmp/in")
        .stdout("/tmp/out file")
        .stderr("/tmp/err")
        .build();
    assert_eq!(
        pane_command(&desc),
        "exec /bin/echo 'hello world' x </tmp/in >'/tmp/out file' 2>/tmp/err"
    );
}

#[test]
fn rejects_interactive_descriptions() {
    let desc = JobDescription::builder("/bin/cat").interactive(true).build();
    assert!(matches!(
        adapter().check_description(&desc),
        Err(ProcessError::InvalidDescription(_))
    ));
}

#[test]
fn session_names_carry_prefix_and_counter() {
    let adapter = TmuxProcessAdapter::with_prefix("bq");
    let first = adapter.next_session_name();
    let second = adapter.clone().next_session_name();
    assert!(first.starts_with(&format!("bq-{}-", std::process::id())));
    assert_ne!(first, second);
}

#[tokio::test]
#[serial(tmux)]
async fn captures_exit_code_of_finished_command() {
    skip_if_no_tmux!();
    let adapter = adapter();
    let desc = JobDescription::builder("/bin/sh")
        .args(["-c", "exit 3"])
        .working_directory("/tmp")
        .build();

    let handle = adapter.start(&desc).await.unwrap();
    wait_done(&adapter, &handle).await;
    assert_eq!(adapter.exit_code(&handle).await.unwrap(), Some(3));

    adapter.cleanup(&handle).await.unwrap();
}

#[tokio::test]
#[serial(tmux)]
async fn passes_environment_and_redirects_output() {
    skip_if_no_tmux!();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let desc = JobDescription::builder("/bin/sh")
        .args(["-c", "echo \"$BQ_TEST_VAR\""])
        .env("BQ_TEST_VAR", "test_value")
        .working_directory(dir.path())
        .stdout(&out)
        .build();

    let adapter = adapter();
    let handle = adapter.start(&desc).await.unwrap();
    wait_done(&adapter, &handle).await;

    assert_eq!(adapter.exit_code(&handle).await.unwrap(), Some(0));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "test_value\n");
    adapter.cleanup(&handle).await.unwrap();
}

#[tokio::test]
#[serial(tmux)]
async fn kill_ends_session() {
    skip_if_no_tmux!();
    let adapter = adapter();
    let desc = JobDescription::builder("sleep")
        .arg("60")
        .working_directory("/tmp")
        .build();

    let handle = adapter.start(&desc).await.unwrap();
    assert!(!adapter.is_done(&handle).await.unwrap());
    assert_eq!(adapter.info(&handle).get("session"), Some(&handle.to_string()));

    adapter.kill(&handle).await.unwrap();
    // Gone sessions count as done with no exit code
    assert!(adapter.is_done(&handle).await.unwrap());
    assert_eq!(adapter.exit_code(&handle).await.unwrap(), None);
    // Idempotent
    adapter.kill(&handle).await.unwrap();
}

#[tokio::test]
async fn missing_working_directory_fails_to_start() {
    let desc = JobDescription::builder("true")
        .working_directory("/nonexistent/dir")
        .build();
    let err = adapter().start(&desc).await.unwrap_err();
    assert!(matches!(err, ProcessError::StartFailed(_)));
}

#[tokio::test]
async fn streams_are_unsupported() {
    let result = adapter().streams(&ProcessHandle::new("bq-0-1")).await;
    assert!(matches!(result, Err(ProcessError::Unsupported(_))));
}
