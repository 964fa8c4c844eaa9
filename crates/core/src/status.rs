// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable status snapshots for jobs and queues.

use crate::job::Job;
use crate::state::JobState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Failure captured on a job during its asynchronous lifetime.
///
/// These are recorded on the job and reported through its status; they are
/// never raised to the caller that submitted the job.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum JobError {
    #[error("failed to start process: {0}")]
    StartFailed(String),
    #[error("failed while waiting for process: {0}")]
    WaitFailed(String),
    #[error("process finished without an exit code")]
    ExitCodeUnavailable,
    #[error("process exceeded its maximum runtime of {max_runtime_ms}ms")]
    TimedOut { max_runtime_ms: u64 },
}

/// Snapshot of one job, taken under the job's lock.
///
/// State, exit code and error always belong to the same transition: a
/// `Done` snapshot carries its exit code, an `Error` snapshot its error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job: Job,
    pub state: JobState,
    pub exit_code: Option<i32>,
    pub error: Option<JobError>,
    /// Milliseconds between process start and the snapshot (or termination)
    pub runtime_ms: Option<u64>,
    /// Backend-specific details (process id, session name, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub info: BTreeMap<String, String>,
}

impl JobStatus {
    pub fn new(job: Job, state: JobState) -> Self {
        Self {
            job,
            state,
            exit_code: None,
            error: None,
            runtime_ms: None,
            info: BTreeMap::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// True when the job finished normally with exit code 0.
    pub fn succeeded(&self) -> bool {
        self.state == JobState::Done && self.exit_code == Some(0)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.job, self.state)?;
        if let Some(code) = self.exit_code {
            write!(f, " exit={}", code)?;
        }
        if let Some(err) = &self.error {
            write!(f, " ({})", err)?;
        }
        Ok(())
    }
}

/// Admission policy of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "slots", rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Every job starts as soon as it is admitted
    Unbounded,
    /// Exactly one running job at a time
    Single,
    /// Up to `n` running jobs at a time
    Bounded(usize),
}

impl QueuePolicy {
    /// Build a policy from a slot count, where 0 means unbounded.
    pub fn from_slots(slots: usize) -> Self {
        match slots {
            0 => QueuePolicy::Unbounded,
            1 => QueuePolicy::Single,
            n => QueuePolicy::Bounded(n),
        }
    }

    /// Maximum number of running jobs, `None` when unbounded.
    pub fn max_concurrent(&self) -> Option<usize> {
        match self {
            QueuePolicy::Unbounded => None,
            QueuePolicy::Single => Some(1),
            QueuePolicy::Bounded(n) => Some(*n),
        }
    }

    pub fn has_free_slot(&self, running: usize) -> bool {
        self.max_concurrent().map_or(true, |max| running < max)
    }
}

/// Snapshot of one queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub name: String,
    pub policy: QueuePolicy,
    /// Admitted jobs whose process has started and not yet finished
    pub running: usize,
    /// Jobs waiting for a free slot
    pub waiting: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub info: BTreeMap<String, String>,
}

impl QueueStatus {
    pub fn max_concurrent(&self) -> Option<usize> {
        self.policy.max_concurrent()
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
