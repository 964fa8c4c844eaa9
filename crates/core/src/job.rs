// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifiers and handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine-assigned sequence number of a submitted job.
///
/// Ids are allocated from a per-engine counter starting at 1, so two
/// engines in the same process hand out overlapping ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Handle returned to callers for a submitted job.
///
/// A plain value: it names the job but holds no reference into the engine.
/// Lookups go through the engine's id index, so a handle outliving its
/// job's history entry simply stops resolving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Name of the process adapter (scheduler) that owns the job
    pub scheduler: String,
    /// Queue the job was submitted to
    pub queue: String,
    #[serde(default)]
    pub interactive: bool,
}

impl Job {
    pub fn new(id: JobId, scheduler: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            id,
            scheduler: scheduler.into(),
            queue: queue.into(),
            interactive: false,
        }
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.scheduler, self.id)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
