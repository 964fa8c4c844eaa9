// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::process::{FakeBehavior, FakeProcessAdapter, ProcessCall};
use serial_test::{parallel, serial};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

/// Assert that captured logs contain the expected substring
fn assert_log(logs: &str, label: &str, expected: &str) {
    assert!(logs.contains(expected), "Should log {label}. Logs:\n{logs}",);
}

/// Start a traced process, returning the fake adapter, traced wrapper, and handle
async fn start_traced_process(
    behavior: FakeBehavior,
) -> (
    FakeProcessAdapter,
    TracedProcess<FakeProcessAdapter>,
    ProcessHandle,
) {
    let fake = FakeProcessAdapter::with_default(behavior);
    let traced = TracedProcess::new(fake.clone());
    let handle = traced.start(&JobDescription::new("echo")).await.unwrap();
    (fake, traced, handle)
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
#[serial(tracing)]
fn traced_start_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedProcess::new(FakeProcessAdapter::new());
        traced
            .start(&JobDescription::builder("/bin/echo").arg("hi").build())
            .await
    });

    assert!(result.is_ok(), "start should succeed: {:?}", result);
    assert_log(&logs, "span name", "process.start");
    assert_log(&logs, "executable", "/bin/echo");
    assert_log(&logs, "backend", "fake");
    assert_log(&logs, "entry message", "starting");
    assert_log(&logs, "completion", "process started");
    assert_log(&logs, "timing", "elapsed_ms");
}

#[test]
#[serial(tracing)]
fn traced_start_logs_error_on_failure() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedProcess::new(FakeProcessAdapter::with_default(
            FakeBehavior::fails_to_start("permission denied"),
        ));
        traced.start(&JobDescription::new("/bin/secret")).await
    });

    assert!(result.is_err());
    assert_log(&logs, "failure", "start failed");
    assert_log(&logs, "cause", "permission denied");
}

#[test]
#[serial(tracing)]
fn traced_kill_logs_operation() {
    let (logs, _) = with_tracing(|| async {
        let (_, traced, handle) = start_traced_process(FakeBehavior::forever()).await;
        traced.kill(&handle).await
    });

    assert_log(&logs, "kill span", "process.kill");
    assert_log(&logs, "kill completion", "killed");
}

#[test]
#[serial(tracing)]
fn traced_probe_failure_logs_warning() {
    let (logs, result) = with_tracing(|| async {
        let (_, traced, handle) =
            start_traced_process(FakeBehavior::forever().probe_fails("connection reset")).await;
        traced.is_done(&handle).await
    });

    assert!(result.is_err());
    assert_log(&logs, "probe failure", "status probe failed");
}

// =============================================================================
// Delegation tests - verify traced wrapper delegates to inner adapter
// =============================================================================

#[tokio::test]
#[parallel(tracing)]
async fn traced_delegates_start_to_inner() {
    let (fake, traced, handle) = start_traced_process(FakeBehavior::default()).await;

    assert_eq!(
        fake.calls(),
        vec![ProcessCall::Start {
            executable: "echo".to_string()
        }]
    );
    assert!(fake.get_process(handle.as_str()).is_some());
    assert_eq!(traced.name(), "fake");
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_delegates_completion_probes() {
    let (fake, traced, handle) = start_traced_process(FakeBehavior::forever()).await;

    assert!(!traced.is_done(&handle).await.unwrap());
    fake.set_exited(handle.as_str(), 7);
    assert!(traced.is_done(&handle).await.unwrap());
    assert_eq!(traced.exit_code(&handle).await.unwrap(), Some(7));
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_delegates_kill_and_cleanup() {
    let (fake, traced, handle) = start_traced_process(FakeBehavior::forever()).await;

    traced.kill(&handle).await.unwrap();
    traced.cleanup(&handle).await.unwrap();

    let process = fake.get_process(handle.as_str()).unwrap();
    assert!(process.killed);
    assert!(process.cleaned_up);
    assert_eq!(traced.info(&handle), fake.info(&handle));
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_delegates_description_checks() {
    let traced = TracedProcess::new(crate::LocalProcessAdapter::new());
    let desc = JobDescription::builder("/bin/true").node_count(3).build();
    assert!(traced.check_description(&desc).is_err());
}
