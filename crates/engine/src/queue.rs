// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named queues and their admission pollers

use crate::executor::{self, JobExecutor};
use crate::registry::Registry;
use bq_adapters::ProcessAdapter;
use bq_core::{JobState, QueuePolicy, QueueStatus};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct QueueInner {
    /// Submitted and not yet admitted, in submission order
    waiting: VecDeque<Arc<JobExecutor>>,
    /// Admitted and not yet reaped
    admitted: Vec<Arc<JobExecutor>>,
}

/// A named admission policy with its own poller.
///
/// The number of admitted, non-terminal jobs never exceeds the policy's
/// bound, and waiting jobs are admitted strictly in submission order.
pub struct Queue<P> {
    name: String,
    policy: QueuePolicy,
    adapter: P,
    polling_delay: Duration,
    registry: Arc<Registry>,
    shutdown: CancellationToken,
    wake: Arc<Notify>,
    inner: Mutex<QueueInner>,
}

impl<P: ProcessAdapter> Queue<P> {
    pub(crate) fn new(
        name: impl Into<String>,
        policy: QueuePolicy,
        adapter: P,
        polling_delay: Duration,
        registry: Arc<Registry>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            name: name.into(),
            policy,
            adapter,
            polling_delay,
            registry,
            shutdown,
            wake: Arc::new(Notify::new()),
            inner: Mutex::new(QueueInner::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// Append a job to the waiting list and wake the poller
    pub(crate) fn enqueue(&self, executor: Arc<JobExecutor>) {
        self.inner.lock().waiting.push_back(executor);
        self.wake();
    }

    /// Track a job the caller already started, bypassing the waiting list
    pub(crate) fn adopt(&self, executor: Arc<JobExecutor>) {
        self.inner.lock().admitted.push(executor);
    }

    pub(crate) fn wake(&self) {
        self.wake.notify_one();
    }

    pub(crate) fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Admitted jobs still starting count neither as running nor waiting.
    pub fn status(&self) -> QueueStatus {
        let inner = self.inner.lock();
        QueueStatus {
            name: self.name.clone(),
            policy: self.policy,
            running: inner
                .admitted
                .iter()
                .filter(|e| e.state() == JobState::Running)
                .count(),
            waiting: inner.waiting.iter().filter(|e| !e.is_terminal()).count(),
            info: BTreeMap::from([(
                "polling_delay_ms".to_string(),
                self.polling_delay.as_millis().to_string(),
            )]),
        }
    }

    /// One poller cycle: reap finished jobs into history, then admit waiting
    /// jobs while the policy has free slots.
    pub(crate) fn poll(&self) {
        let mut retired = Vec::new();
        let mut admitted = Vec::new();
        {
            let mut inner = self.inner.lock();
            let mut reap = |executor: &Arc<JobExecutor>| {
                if executor.is_terminal() {
                    retired.push(Arc::clone(executor));
                    false
                } else {
                    true
                }
            };
            inner.admitted.retain(&mut reap);
            // Cancelled before admission
            inner.waiting.retain(&mut reap);

            while self.policy.has_free_slot(inner.admitted.len()) {
                let Some(next) = inner.waiting.pop_front() else {
                    break;
                };
                inner.admitted.push(Arc::clone(&next));
                admitted.push(next);
            }
            tracing::debug!(
                queue = self.name,
                running = inner.admitted.len(),
                waiting = inner.waiting.len(),
                "poll cycle"
            );
        }

        for executor in retired {
            self.registry.retire(&executor);
        }
        for executor in admitted {
            tracing::info!(job = %executor.job(), queue = self.name, "job admitted");
            tokio::spawn(executor::run(
                executor,
                self.adapter.clone(),
                self.polling_delay,
                self.shutdown.clone(),
                self.wake_handle(),
            ));
        }
    }

    /// Poll once per polling delay, or earlier when woken, until shutdown.
    pub(crate) async fn run_poller(self: Arc<Self>) {
        tracing::debug!(queue = self.name, policy = ?self.policy, "queue poller started");
        loop {
            self.poll();
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = self.wake.notified() => {}
                _ = tokio::time::sleep(self.polling_delay) => {}
            }
        }
        tracing::debug!(queue = self.name, "queue poller stopped");
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
