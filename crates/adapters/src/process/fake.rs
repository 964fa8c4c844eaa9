// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProcessAdapter, ProcessError, ProcessHandle, Streams};
use async_trait::async_trait;
use bq_core::JobDescription;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Scripted outcome of a fake process
#[derive(Debug, Clone)]
pub struct FakeBehavior {
    /// How long the process runs; `None` runs until killed or [`FakeProcessAdapter::set_exited`]
    pub run_for: Option<Duration>,
    /// Exit code reported once done; `None` simulates a lost exit code
    pub exit_code: Option<i32>,
    /// Delay inside `start` before the process exists
    pub start_delay: Duration,
    /// Make `start` fail with this message
    pub start_error: Option<String>,
    /// Make `is_done` fail with this message
    pub probe_error: Option<String>,
    /// Content of stdout for interactive processes
    pub stdout: String,
}

impl Default for FakeBehavior {
    fn default() -> Self {
        Self {
            run_for: Some(Duration::ZERO),
            exit_code: Some(0),
            start_delay: Duration::ZERO,
            start_error: None,
            probe_error: None,
            stdout: String::new(),
        }
    }
}

impl FakeBehavior {
    /// Finish right away with the given exit code
    pub fn exits(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    /// Never finish on its own
    pub fn forever() -> Self {
        Self {
            run_for: None,
            ..Self::default()
        }
    }

    pub fn fails_to_start(message: impl Into<String>) -> Self {
        Self {
            start_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Run for `duration` before finishing
    pub fn after(mut self, duration: Duration) -> Self {
        self.run_for = Some(duration);
        self
    }

    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn loses_exit_code(mut self) -> Self {
        self.exit_code = None;
        self
    }

    pub fn probe_fails(mut self, message: impl Into<String>) -> Self {
        self.probe_error = Some(message.into());
        self
    }

    pub fn stdout(mut self, content: impl Into<String>) -> Self {
        self.stdout = content.into();
        self
    }
}

/// Recorded process call
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessCall {
    Start { executable: String },
    IsDone { id: String },
    ExitCode { id: String },
    Kill { id: String },
    Streams { id: String },
    Cleanup { id: String },
}

/// Fake process state
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub id: String,
    pub description: JobDescription,
    pub behavior: FakeBehavior,
    pub started_at: Instant,
    pub finished: bool,
    pub killed: bool,
    pub exit_code: Option<i32>,
    pub cleaned_up: bool,
}

impl FakeProcess {
    fn refresh(&mut self) -> bool {
        if !self.finished {
            if let Some(run_for) = self.behavior.run_for {
                if self.started_at.elapsed() >= run_for {
                    self.finished = true;
                    self.exit_code = self.behavior.exit_code;
                    return true;
                }
            }
        }
        false
    }
}

#[derive(Default)]
struct FakeProcessState {
    processes: HashMap<String, FakeProcess>,
    start_order: Vec<String>,
    calls: Vec<ProcessCall>,
    behaviors: HashMap<String, FakeBehavior>,
    default_behavior: FakeBehavior,
    next_id: u64,
    live: usize,
    peak_live: usize,
}

impl FakeProcessState {
    fn finished(&mut self) {
        self.live = self.live.saturating_sub(1);
    }
}

/// Fake process adapter for testing.
///
/// Time is measured with `tokio::time`, so paused-clock tests control
/// when processes finish.
#[derive(Clone, Default)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter whose processes follow `behavior` unless overridden per executable
    pub fn with_default(behavior: FakeBehavior) -> Self {
        let adapter = Self::default();
        adapter.inner.lock().default_behavior = behavior;
        adapter
    }

    /// Script processes started for `executable`
    pub fn set_behavior(&self, executable: &str, behavior: FakeBehavior) {
        self.inner
            .lock()
            .behaviors
            .insert(executable.to_string(), behavior);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    pub fn get_process(&self, id: &str) -> Option<FakeProcess> {
        self.inner.lock().processes.get(id).cloned()
    }

    /// Descriptions of started processes, in start order
    pub fn started(&self) -> Vec<JobDescription> {
        let inner = self.inner.lock();
        inner
            .start_order
            .iter()
            .filter_map(|id| inner.processes.get(id))
            .map(|p| p.description.clone())
            .collect()
    }

    /// Processes started and not yet finished
    pub fn live(&self) -> usize {
        self.inner.lock().live
    }

    /// Highest number of simultaneously live processes
    pub fn peak_live(&self) -> usize {
        self.inner.lock().peak_live
    }

    /// Mark a process as exited
    pub fn set_exited(&self, id: &str, exit_code: i32) {
        let mut inner = self.inner.lock();
        let newly_finished = match inner.processes.get_mut(id) {
            Some(process) if !process.finished => {
                process.finished = true;
                process.exit_code = Some(exit_code);
                true
            }
            _ => false,
        };
        if newly_finished {
            inner.finished();
        }
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start(&self, description: &JobDescription) -> Result<ProcessHandle, ProcessError> {
        let executable = description.executable.clone().unwrap_or_default();
        let behavior = {
            let mut inner = self.inner.lock();
            inner.calls.push(ProcessCall::Start {
                executable: executable.clone(),
            });
            inner
                .behaviors
                .get(&executable)
                .cloned()
                .unwrap_or_else(|| inner.default_behavior.clone())
        };

        if !behavior.start_delay.is_zero() {
            tokio::time::sleep(behavior.start_delay).await;
        }
        if let Some(message) = &behavior.start_error {
            return Err(ProcessError::StartFailed(message.clone()));
        }

        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = format!("fake-{}", inner.next_id);
        inner.processes.insert(
            id.clone(),
            FakeProcess {
                id: id.clone(),
                description: description.clone(),
                behavior,
                started_at: Instant::now(),
                finished: false,
                killed: false,
                exit_code: None,
                cleaned_up: false,
            },
        );
        inner.start_order.push(id.clone());
        inner.live += 1;
        inner.peak_live = inner.peak_live.max(inner.live);

        Ok(ProcessHandle::new(id))
    }

    async fn is_done(&self, handle: &ProcessHandle) -> Result<bool, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::IsDone {
            id: handle.to_string(),
        });

        let process = inner
            .processes
            .get_mut(handle.as_str())
            .ok_or_else(|| ProcessError::NotFound(handle.to_string()))?;
        if let Some(message) = &process.behavior.probe_error {
            return Err(ProcessError::CommandFailed(message.clone()));
        }
        let newly_finished = process.refresh();
        let done = process.finished;
        if newly_finished {
            inner.finished();
        }
        Ok(done)
    }

    async fn exit_code(&self, handle: &ProcessHandle) -> Result<Option<i32>, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::ExitCode {
            id: handle.to_string(),
        });

        match inner.processes.get(handle.as_str()) {
            Some(process) => Ok(process.exit_code),
            None => Err(ProcessError::NotFound(handle.to_string())),
        }
    }

    async fn kill(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Kill {
            id: handle.to_string(),
        });

        let newly_finished = match inner.processes.get_mut(handle.as_str()) {
            Some(process) => {
                if process.refresh() {
                    true
                } else if !process.finished {
                    process.finished = true;
                    process.killed = true;
                    // SIGKILL
                    process.exit_code = Some(137);
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if newly_finished {
            inner.finished();
        }
        Ok(())
    }

    async fn streams(&self, handle: &ProcessHandle) -> Result<Streams, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Streams {
            id: handle.to_string(),
        });

        let process = inner
            .processes
            .get(handle.as_str())
            .ok_or_else(|| ProcessError::NotFound(handle.to_string()))?;
        if !process.description.interactive {
            return Err(ProcessError::Unsupported(format!(
                "{} is not interactive",
                handle
            )));
        }
        Ok(Streams {
            stdin: Box::new(tokio::io::sink()),
            stdout: Box::new(std::io::Cursor::new(
                process.behavior.stdout.clone().into_bytes(),
            )),
            stderr: Box::new(tokio::io::empty()),
        })
    }

    async fn cleanup(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Cleanup {
            id: handle.to_string(),
        });

        if let Some(process) = inner.processes.get_mut(handle.as_str()) {
            process.cleaned_up = true;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
