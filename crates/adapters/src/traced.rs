// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::process::{ProcessAdapter, ProcessError, ProcessHandle, Streams};
use async_trait::async_trait;
use bq_core::JobDescription;
use std::collections::BTreeMap;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcess<P> {
    inner: P,
}

impl<P> TracedProcess<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcess<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn check_description(&self, description: &JobDescription) -> Result<(), ProcessError> {
        let result = self.inner.check_description(description);
        if let Err(ref e) = result {
            tracing::debug!(backend = self.inner.name(), error = %e, "description rejected");
        }
        result
    }

    async fn start(&self, description: &JobDescription) -> Result<ProcessHandle, ProcessError> {
        let span = tracing::info_span!(
            "process.start",
            backend = self.inner.name(),
            executable = description.executable.as_deref().unwrap_or_default()
        );
        async {
            tracing::info!(
                args = description.arguments.len(),
                env_count = description.environment.len(),
                "starting"
            );
            let start = std::time::Instant::now();
            let result = self.inner.start(description).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(handle) => tracing::info!(process = %handle, elapsed_ms, "process started"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "start failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn is_done(&self, handle: &ProcessHandle) -> Result<bool, ProcessError> {
        let result = self.inner.is_done(handle).await;
        match &result {
            Ok(done) => tracing::trace!(process = %handle, done, "checked"),
            Err(e) => tracing::warn!(process = %handle, error = %e, "status probe failed"),
        }
        result
    }

    async fn exit_code(&self, handle: &ProcessHandle) -> Result<Option<i32>, ProcessError> {
        let result = self.inner.exit_code(handle).await;
        tracing::debug!(process = %handle, exit_code = ?result.as_ref().ok().copied().flatten(), "exit code");
        result
    }

    async fn kill(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        let result = self.inner.kill(handle).await;
        tracing::info_span!("process.kill", process = %handle).in_scope(|| match &result {
            Ok(()) => tracing::info!("killed"),
            Err(e) => tracing::warn!(error = %e, "kill failed (may be expected)"),
        });
        result
    }

    async fn streams(&self, handle: &ProcessHandle) -> Result<Streams, ProcessError> {
        let result = self.inner.streams(handle).await;
        if let Err(ref e) = result {
            tracing::error!(process = %handle, error = %e, "streams unavailable");
        }
        result
    }

    async fn cleanup(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        let result = self.inner.cleanup(handle).await;
        if let Err(ref e) = result {
            tracing::warn!(process = %handle, error = %e, "cleanup failed");
        }
        result
    }

    fn info(&self, handle: &ProcessHandle) -> BTreeMap<String, String> {
        self.inner.info(handle)
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
