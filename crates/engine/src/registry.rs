// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry and bounded history

use crate::executor::JobExecutor;
use bq_core::JobId;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Default)]
struct RegistryInner {
    jobs: HashMap<JobId, Arc<JobExecutor>>,
    /// Retired (terminal) jobs, oldest first
    history: VecDeque<JobId>,
}

/// Every job the engine still knows about, indexed by id.
///
/// Jobs stay resolvable from submission until they are evicted from the
/// history. Only retired jobs enter the history, so jobs that are waiting
/// or running are never evicted.
pub(crate) struct Registry {
    max_history: usize,
    inner: Mutex<RegistryInner>,
}

impl Registry {
    pub(crate) fn new(max_history: usize) -> Self {
        Self {
            max_history,
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    pub(crate) fn register(&self, executor: Arc<JobExecutor>) {
        let id = executor.job().id;
        self.inner.lock().jobs.insert(id, executor);
    }

    pub(crate) fn get(&self, id: JobId) -> Option<Arc<JobExecutor>> {
        self.inner.lock().jobs.get(&id).cloned()
    }

    /// Move a terminal job into history, evicting the oldest entries
    /// beyond the bound.
    pub(crate) fn retire(&self, executor: &JobExecutor) {
        if !executor.retire() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.history.push_back(executor.job().id);
        while inner.history.len() > self.max_history {
            if let Some(evicted) = inner.history.pop_front() {
                inner.jobs.remove(&evicted);
                tracing::debug!(job = evicted.as_u64(), "evicted from history");
            }
        }
    }

    /// All known executors, ordered by job id
    pub(crate) fn executors(&self) -> Vec<Arc<JobExecutor>> {
        let mut executors: Vec<_> = self.inner.lock().jobs.values().cloned().collect();
        executors.sort_by_key(|e| e.job().id);
        executors
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub(crate) fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
