// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a submitted job.
///
/// ```text
/// Initial ──> Running ──> Done | Error | Killed
///    └──────> Killed | Error
/// ```
///
/// `Done`, `Error` and `Killed` are terminal: a job never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Submitted, waiting for admission to its queue
    Initial,
    /// Process started and not yet finished
    Running,
    /// Process exited normally (any exit code)
    Done,
    /// Process failed to start or could not be monitored
    Error,
    /// Cancelled, or killed after exceeding its maximum runtime
    Killed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Error | JobState::Killed)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, JobState::Running)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match self {
            JobState::Initial => matches!(
                next,
                JobState::Running | JobState::Error | JobState::Killed
            ),
            JobState::Running => next.is_terminal(),
            JobState::Done | JobState::Error | JobState::Killed => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Initial => write!(f, "INITIAL"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Done => write!(f, "DONE"),
            JobState::Error => write!(f, "ERROR"),
            JobState::Killed => write!(f, "KILLED"),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
