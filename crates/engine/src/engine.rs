// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job queue engine: submission, lookup, cancellation and waiting

use crate::error::EngineError;
use crate::executor::{self, JobExecutor};
use crate::queue::Queue;
use crate::registry::Registry;
use bq_adapters::{ProcessAdapter, ProcessError, Streams};
use bq_core::{
    EngineConfig, Job, JobDescription, JobId, JobState, JobStatus, QueuePolicy,
    QueueStatus, MULTI_QUEUE, SINGLE_QUEUE, UNLIMITED_QUEUE,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Runs submitted jobs through a process backend under per-queue
/// admission control.
///
/// Every queue gets a poller task on the current Tokio runtime, so the
/// engine must be created from within one. Dropping the engine has the same
/// effect as [`end`](Self::end).
pub struct JobQueueEngine<P: ProcessAdapter> {
    adapter: P,
    config: EngineConfig,
    working_dir: PathBuf,
    queues: Vec<Arc<Queue<P>>>,
    registry: Arc<Registry>,
    next_id: AtomicU64,
    submitted: AtomicU64,
    shutdown: CancellationToken,
}

impl<P: ProcessAdapter> JobQueueEngine<P> {
    /// Create an engine and start its queue pollers.
    ///
    /// `working_dir` is the base for jobs without an absolute working
    /// directory.
    pub fn new(
        adapter: P,
        config: EngineConfig,
        working_dir: impl Into<PathBuf>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let registry = Arc::new(Registry::new(config.max_history));
        let shutdown = CancellationToken::new();
        let delay = config.polling_delay();

        let mut policies = vec![
            (SINGLE_QUEUE.to_string(), QueuePolicy::Single),
            (
                MULTI_QUEUE.to_string(),
                QueuePolicy::Bounded(config.max_concurrent_jobs),
            ),
            (UNLIMITED_QUEUE.to_string(), QueuePolicy::Unbounded),
        ];
        policies.extend(
            config
                .queues
                .iter()
                .map(|q| (q.name.trim().to_string(), QueuePolicy::from_slots(q.max_concurrent))),
        );

        let queues: Vec<_> = policies
            .into_iter()
            .map(|(name, policy)| {
                Arc::new(Queue::new(
                    name,
                    policy,
                    adapter.clone(),
                    delay,
                    Arc::clone(&registry),
                    shutdown.clone(),
                ))
            })
            .collect();
        for queue in &queues {
            tokio::spawn(Arc::clone(queue).run_poller());
        }

        tracing::info!(
            scheduler = adapter.name(),
            queues = queues.len(),
            polling_delay_ms = config.polling_delay_ms,
            "job queue engine started"
        );

        Ok(Self {
            adapter,
            config,
            working_dir: working_dir.into(),
            queues,
            registry,
            next_id: AtomicU64::new(0),
            submitted: AtomicU64::new(0),
            shutdown,
        })
    }

    /// Name of the backend; the scheduler part of every job handle
    pub fn scheduler_name(&self) -> &str {
        self.adapter.name()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Number of jobs accepted since the engine was created
    pub fn submitted_jobs(&self) -> u64 {
        self.submitted.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Stop all queue pollers. Running jobs are left running; further
    /// submissions fail with [`EngineError::Closed`].
    pub fn end(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!(scheduler = self.adapter.name(), "job queue engine ending");
            self.shutdown.cancel();
        }
    }

    // -- queues ---------------------------------------------------------------

    pub fn queue_names(&self) -> Vec<String> {
        self.queues.iter().map(|q| q.name().to_string()).collect()
    }

    pub fn default_queue_name(&self) -> &str {
        SINGLE_QUEUE
    }

    pub fn get_queue_status(&self, name: &str) -> Result<QueueStatus, EngineError> {
        Ok(self.queue(name)?.status())
    }

    /// Statuses of the named queues, or of every queue when `names` is empty
    pub fn get_queue_statuses(&self, names: &[&str]) -> Vec<Result<QueueStatus, EngineError>> {
        if names.is_empty() {
            return self.queues.iter().map(|q| Ok(q.status())).collect();
        }
        names
            .iter()
            .map(|name| self.get_queue_status(name))
            .collect()
    }

    /// Handles of every known job in the named queues (all queues when
    /// `queue_names` is empty), ordered by id.
    pub fn get_jobs(&self, queue_names: &[&str]) -> Result<Vec<Job>, EngineError> {
        for name in queue_names {
            self.queue(name)?;
        }
        Ok(self
            .registry
            .executors()
            .iter()
            .map(|e| e.job())
            .filter(|job| queue_names.is_empty() || queue_names.contains(&job.queue.as_str()))
            .cloned()
            .collect())
    }

    fn queue(&self, name: &str) -> Result<&Arc<Queue<P>>, EngineError> {
        self.queues
            .iter()
            .find(|q| q.name() == name)
            .ok_or_else(|| EngineError::NoSuchQueue(name.to_string()))
    }

    // -- submission -----------------------------------------------------------

    /// Submit a batch job. Returns as soon as the job is queued.
    pub fn submit_job(&self, description: &JobDescription) -> Result<Job, EngineError> {
        if description.interactive {
            return Err(EngineError::InvalidJobDescription(
                "interactive jobs must be submitted with submit_interactive_job".to_string(),
            ));
        }
        let queue_name = description
            .queue
            .as_deref()
            .unwrap_or_else(|| self.default_queue_name());
        let (queue, executor) = self.prepare(description, queue_name)?;
        let job = executor.job().clone();

        queue.enqueue(executor);
        tracing::info!(
            job = %job,
            queue = queue.name(),
            command = %description.command_line(),
            "job submitted"
        );
        Ok(job)
    }

    /// Submit an interactive job and return its standard streams.
    ///
    /// The job bypasses admission control (it joins the unlimited queue) and
    /// is started before this returns. A start failure is both returned and
    /// recorded on the job as ERROR. Dropping the returned future does not
    /// strand the job: it is still started, then killed.
    pub async fn submit_interactive_job(
        &self,
        description: &JobDescription,
    ) -> Result<(Job, Streams), EngineError> {
        if !description.interactive {
            return Err(EngineError::InvalidJobDescription(
                "batch jobs must be submitted with submit_job".to_string(),
            ));
        }
        let (queue, executor) = self.prepare(description, UNLIMITED_QUEUE)?;
        let job = executor.job().clone();
        queue.adopt(Arc::clone(&executor));
        tracing::info!(job = %job, command = %description.command_line(), "interactive job submitted");

        let (reply, streams) = oneshot::channel();
        tokio::spawn(executor::run_interactive(
            executor,
            self.adapter.clone(),
            self.config.polling_delay(),
            self.shutdown.clone(),
            queue.wake_handle(),
            reply,
        ));

        let streams = streams
            .await
            .map_err(|_| {
                EngineError::Backend(ProcessError::StartFailed(format!(
                    "{} start task ended without a result",
                    job
                )))
            })?
            .map_err(EngineError::Backend)?;
        Ok((job, streams))
    }

    /// Validate, copy and register a description; shared by both submit paths.
    fn prepare(
        &self,
        description: &JobDescription,
        queue_name: &str,
    ) -> Result<(&Arc<Queue<P>>, Arc<JobExecutor>), EngineError> {
        if !self.is_open() {
            return Err(EngineError::Closed);
        }
        description.validate()?;
        self.adapter
            .check_description(description)
            .map_err(|e| match e {
                ProcessError::InvalidDescription(reason) => {
                    EngineError::InvalidJobDescription(reason)
                }
                other => EngineError::InvalidJobDescription(other.to_string()),
            })?;
        let queue = self.queue(queue_name)?;

        let id = JobId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut copy = description.clone();
        copy.working_directory = Some(description.resolve_working_directory(&self.working_dir));
        copy.queue = Some(queue.name().to_string());

        let job = Job::new(id, self.adapter.name(), queue.name()).interactive(copy.interactive);
        let executor = Arc::new(JobExecutor::new(job, copy));
        self.registry.register(Arc::clone(&executor));
        self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok((queue, executor))
    }

    // -- status and control ---------------------------------------------------

    fn lookup(&self, job: &Job) -> Result<Arc<JobExecutor>, EngineError> {
        if job.scheduler != self.adapter.name() {
            return Err(EngineError::NoSuchJob(job.to_string()));
        }
        self.registry
            .get(job.id)
            .ok_or_else(|| EngineError::NoSuchJob(job.to_string()))
    }

    pub fn get_job_status(&self, job: &Job) -> Result<JobStatus, EngineError> {
        Ok(self.lookup(job)?.status())
    }

    /// Positionally aligned statuses; `None` entries stay `None`.
    pub fn get_job_statuses(
        &self,
        jobs: &[Option<Job>],
    ) -> Vec<Option<Result<JobStatus, EngineError>>> {
        jobs.iter()
            .map(|job| job.as_ref().map(|job| self.get_job_status(job)))
            .collect()
    }

    /// Request termination of a job.
    ///
    /// Waiting jobs become KILLED right away; running jobs are killed by
    /// their run task shortly after. Terminal jobs are left as they are.
    pub fn cancel_job(&self, job: &Job) -> Result<JobStatus, EngineError> {
        let executor = self.lookup(job)?;
        let status = executor.cancel();
        if let Ok(queue) = self.queue(&job.queue) {
            queue.wake();
        }
        Ok(status)
    }

    // -- waiting --------------------------------------------------------------

    /// Wait until the job is terminal or `timeout` elapses
    /// (`Duration::ZERO` waits indefinitely).
    pub async fn wait_until_done(
        &self,
        job: &Job,
        timeout: Duration,
    ) -> Result<JobStatus, EngineError> {
        self.wait_until_done_or_cancelled(job, timeout, &CancellationToken::new())
            .await
    }

    /// Wait until the job has started (or already finished) or `timeout`
    /// elapses (`Duration::ZERO` waits indefinitely).
    pub async fn wait_until_running(
        &self,
        job: &Job,
        timeout: Duration,
    ) -> Result<JobStatus, EngineError> {
        self.wait_until_running_or_cancelled(job, timeout, &CancellationToken::new())
            .await
    }

    /// Like [`wait_until_done`](Self::wait_until_done), but returns the last
    /// known status as soon as `cancel` fires or the engine ends.
    pub async fn wait_until_done_or_cancelled(
        &self,
        job: &Job,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<JobStatus, EngineError> {
        self.wait_for(job, timeout, cancel, JobStatus::is_done)
            .await
    }

    /// Like [`wait_until_running`](Self::wait_until_running), but returns the
    /// last known status as soon as `cancel` fires or the engine ends.
    pub async fn wait_until_running_or_cancelled(
        &self,
        job: &Job,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<JobStatus, EngineError> {
        self.wait_for(job, timeout, cancel, |status| {
            status.state != JobState::Initial
        })
        .await
    }

    async fn wait_for(
        &self,
        job: &Job,
        timeout: Duration,
        cancel: &CancellationToken,
        satisfied: fn(&JobStatus) -> bool,
    ) -> Result<JobStatus, EngineError> {
        // Holding the executor keeps the wait valid even if history evicts it
        let executor = self.lookup(job)?;
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        let polling_delay = self.config.polling_delay();

        loop {
            let status = executor.status();
            if satisfied(&status) {
                return Ok(status);
            }
            let delay = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(status);
                    }
                    polling_delay.min(deadline - now)
                }
                None => polling_delay,
            };
            tokio::select! {
                _ = cancel.cancelled() => return Ok(executor.status()),
                _ = self.shutdown.cancelled() => return Ok(executor.status()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

impl<P: ProcessAdapter> Drop for JobQueueEngine<P> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
