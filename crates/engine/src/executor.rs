// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job state machine and the task that drives it
//!
//! A [`JobExecutor`] holds everything known about one submitted job under a
//! single lock. Its run task starts the backend process, then probes it once
//! per polling delay until it reaches a terminal state:
//!
//! ```text
//! INITIAL -> RUNNING -> { DONE, ERROR, KILLED }
//! INITIAL -> KILLED     cancelled before start
//! INITIAL -> ERROR      backend failed to start
//! ```

use bq_adapters::{ProcessAdapter, ProcessError, ProcessHandle, Streams};
use bq_core::{Job, JobDescription, JobError, JobState, JobStatus};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct ExecutorState {
    state: JobState,
    exit_code: Option<i32>,
    error: Option<JobError>,
    handle: Option<ProcessHandle>,
    info: BTreeMap<String, String>,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    kill_requested: bool,
    retired: bool,
}

/// One submitted job.
#[derive(Debug)]
pub struct JobExecutor {
    job: Job,
    description: JobDescription,
    inner: Mutex<ExecutorState>,
    kill: Notify,
}

impl JobExecutor {
    pub fn new(job: Job, description: JobDescription) -> Self {
        Self {
            job,
            description,
            inner: Mutex::new(ExecutorState {
                state: JobState::Initial,
                exit_code: None,
                error: None,
                handle: None,
                info: BTreeMap::new(),
                started_at: None,
                finished_at: None,
                kill_requested: false,
                retired: false,
            }),
            kill: Notify::new(),
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// The engine's private copy of the submitted description
    pub fn description(&self) -> &JobDescription {
        &self.description
    }

    pub fn state(&self) -> JobState {
        self.inner.lock().state
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Consistent snapshot of the job
    pub fn status(&self) -> JobStatus {
        let inner = self.inner.lock();
        let mut status = JobStatus::new(self.job.clone(), inner.state);
        status.exit_code = inner.exit_code;
        status.error = inner.error.clone();
        status.runtime_ms = inner.started_at.map(|started| {
            let end = inner.finished_at.unwrap_or_else(Instant::now);
            end.saturating_duration_since(started).as_millis() as u64
        });
        status.info = inner.info.clone();
        status
    }

    /// Request termination.
    ///
    /// A job that never started goes straight to KILLED. A running job is
    /// flagged and its run task woken to perform the backend kill. Terminal
    /// jobs are left untouched, so repeated cancels are harmless.
    pub fn cancel(&self) -> JobStatus {
        {
            let mut inner = self.inner.lock();
            match inner.state {
                JobState::Initial => {
                    inner.state = JobState::Killed;
                    inner.finished_at = Some(Instant::now());
                    tracing::info!(job = %self.job, "job cancelled before start");
                }
                JobState::Running if !inner.kill_requested => {
                    inner.kill_requested = true;
                    self.kill.notify_one();
                    tracing::info!(job = %self.job, "kill requested");
                }
                _ => {}
            }
        }
        self.status()
    }

    /// Mark the executor as moved to history; true only the first time
    pub(crate) fn retire(&self) -> bool {
        let mut inner = self.inner.lock();
        !std::mem::replace(&mut inner.retired, true)
    }

    /// Fail a started job that will not be supervised
    pub(crate) fn abandon(&self, error: JobError) {
        self.finish(JobState::Error, None, Some(error));
    }

    fn kill_requested(&self) -> bool {
        self.inner.lock().kill_requested
    }

    /// Record a started process. Returns false when the job was cancelled
    /// while `start` was in flight.
    fn attach(&self, handle: &ProcessHandle, info: BTreeMap<String, String>) -> bool {
        let mut inner = self.inner.lock();
        inner.handle = Some(handle.clone());
        inner.info = info;
        if inner.state != JobState::Initial {
            return false;
        }
        inner.state = JobState::Running;
        inner.started_at = Some(Instant::now());
        tracing::info!(job = %self.job, process = %handle, "job running");
        true
    }

    /// Apply a terminal transition; ignored if the job is already terminal.
    fn finish(&self, state: JobState, exit_code: Option<i32>, error: Option<JobError>) {
        let mut inner = self.inner.lock();
        if !inner.state.can_transition_to(state) {
            return;
        }
        inner.state = state;
        inner.exit_code = exit_code;
        inner.error = error;
        inner.finished_at = Some(Instant::now());
        match &inner.error {
            Some(error) => tracing::info!(job = %self.job, %state, %error, "job finished"),
            None => tracing::info!(job = %self.job, %state, exit_code, "job finished"),
        }
    }

    fn elapsed(&self) -> Duration {
        self.inner
            .lock()
            .started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }
}

/// Start the backend process for a job that is still INITIAL.
///
/// Returns `Ok(None)` when the job was cancelled before or during the start
/// (a process that started anyway is killed and cleaned up). A start failure
/// is recorded as ERROR on the executor and also returned.
pub(crate) async fn start<P: ProcessAdapter>(
    executor: &JobExecutor,
    adapter: &P,
) -> Result<Option<ProcessHandle>, ProcessError> {
    if executor.state() != JobState::Initial {
        return Ok(None);
    }

    let handle = match adapter.start(executor.description()).await {
        Ok(handle) => handle,
        Err(e) => {
            executor.finish(
                JobState::Error,
                None,
                Some(JobError::StartFailed(e.to_string())),
            );
            return Err(e);
        }
    };

    if executor.attach(&handle, adapter.info(&handle)) {
        return Ok(Some(handle));
    }

    // Cancelled while starting
    kill_quietly(executor, adapter, &handle).await;
    release(adapter, &handle).await;
    Ok(None)
}

/// Monitor a RUNNING job until it reaches a terminal state or the engine
/// shuts down, then release the backend's bookkeeping for it.
pub(crate) async fn supervise<P: ProcessAdapter>(
    executor: &JobExecutor,
    adapter: &P,
    handle: &ProcessHandle,
    polling_delay: Duration,
    shutdown: &CancellationToken,
) {
    let max_runtime = executor.description().max_runtime();

    loop {
        if executor.kill_requested() {
            kill_quietly(executor, adapter, handle).await;
            executor.finish(JobState::Killed, None, None);
            break;
        }

        let elapsed = executor.elapsed();
        if let Some(max) = max_runtime.filter(|max| elapsed >= *max) {
            tracing::info!(job = %executor.job(), elapsed_ms = elapsed.as_millis() as u64, "maximum runtime exceeded");
            kill_quietly(executor, adapter, handle).await;
            executor.finish(
                JobState::Killed,
                None,
                Some(JobError::TimedOut {
                    max_runtime_ms: max.as_millis() as u64,
                }),
            );
            break;
        }

        match adapter.is_done(handle).await {
            Ok(true) => {
                match adapter.exit_code(handle).await {
                    Ok(Some(code)) => executor.finish(JobState::Done, Some(code), None),
                    Ok(None) => executor.finish(
                        JobState::Error,
                        None,
                        Some(JobError::ExitCodeUnavailable),
                    ),
                    Err(e) => executor.finish(
                        JobState::Error,
                        None,
                        Some(JobError::WaitFailed(e.to_string())),
                    ),
                }
                break;
            }
            Ok(false) => {}
            Err(e) => {
                executor.finish(
                    JobState::Error,
                    None,
                    Some(JobError::WaitFailed(e.to_string())),
                );
                kill_quietly(executor, adapter, handle).await;
                break;
            }
        }

        // Wake up in time to enforce the runtime limit
        let delay = match max_runtime {
            Some(max) => polling_delay.min(max.saturating_sub(executor.elapsed())),
            None => polling_delay,
        };
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!(job = %executor.job(), "engine shut down, leaving job running");
                return;
            }
            _ = executor.kill.notified() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }

    release(adapter, handle).await;
}

/// Full lifecycle of a queued job: start, then supervise.
pub(crate) async fn run<P: ProcessAdapter>(
    executor: Arc<JobExecutor>,
    adapter: P,
    polling_delay: Duration,
    shutdown: CancellationToken,
    finished: Arc<Notify>,
) {
    // Start failures are already recorded on the executor
    if let Ok(Some(handle)) = start(&executor, &adapter).await {
        supervise(&executor, &adapter, &handle, polling_delay, &shutdown).await;
    }
    finished.notify_one();
}

/// Lifecycle of an interactive job: start, hand the streams to the
/// submitter through `reply`, then supervise.
///
/// Runs on its own task so the job is finished even when the submitter
/// stops waiting. A job whose streams nobody received is killed.
pub(crate) async fn run_interactive<P: ProcessAdapter>(
    executor: Arc<JobExecutor>,
    adapter: P,
    polling_delay: Duration,
    shutdown: CancellationToken,
    finished: Arc<Notify>,
    reply: oneshot::Sender<Result<Streams, ProcessError>>,
) {
    let handle = match start(&executor, &adapter).await {
        Ok(Some(handle)) => handle,
        Ok(None) => {
            let _ = reply.send(Err(ProcessError::StartFailed(format!(
                "{} was cancelled while starting",
                executor.job()
            ))));
            finished.notify_one();
            return;
        }
        Err(e) => {
            let _ = reply.send(Err(e));
            finished.notify_one();
            return;
        }
    };

    match adapter.streams(&handle).await {
        Ok(streams) => {
            if reply.send(Ok(streams)).is_err() {
                tracing::info!(job = %executor.job(), "submitter went away, killing interactive job");
                executor.cancel();
            }
            supervise(&executor, &adapter, &handle, polling_delay, &shutdown).await;
        }
        Err(e) => {
            // Without streams the job is useless to the submitter
            executor.abandon(JobError::StartFailed(e.to_string()));
            kill_quietly(&executor, &adapter, &handle).await;
            release(&adapter, &handle).await;
            let _ = reply.send(Err(e));
        }
    }
    finished.notify_one();
}

async fn kill_quietly<P: ProcessAdapter>(
    executor: &JobExecutor,
    adapter: &P,
    handle: &ProcessHandle,
) {
    if let Err(e) = adapter.kill(handle).await {
        tracing::warn!(job = %executor.job(), error = %e, "kill failed");
    }
}

async fn release<P: ProcessAdapter>(adapter: &P, handle: &ProcessHandle) {
    if let Err(e) = adapter.cleanup(handle).await {
        tracing::warn!(process = %handle, error = %e, "cleanup failed");
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
