// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op process adapter for dry runs.

use super::{ProcessAdapter, ProcessError, ProcessHandle, Streams};
use async_trait::async_trait;
use bq_core::JobDescription;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process adapter that starts nothing.
///
/// Every job finishes immediately with exit code 0.
#[derive(Clone, Debug, Default)]
pub struct NoOpProcessAdapter {
    next_id: Arc<AtomicU64>,
}

impl NoOpProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcessAdapter for NoOpProcessAdapter {
    fn name(&self) -> &str {
        "noop"
    }

    async fn start(&self, _description: &JobDescription) -> Result<ProcessHandle, ProcessError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ProcessHandle::new(format!("noop-{}", n)))
    }

    async fn is_done(&self, _handle: &ProcessHandle) -> Result<bool, ProcessError> {
        Ok(true)
    }

    async fn exit_code(&self, _handle: &ProcessHandle) -> Result<Option<i32>, ProcessError> {
        Ok(Some(0))
    }

    async fn kill(&self, _handle: &ProcessHandle) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn streams(&self, handle: &ProcessHandle) -> Result<Streams, ProcessError> {
        Err(ProcessError::Unsupported(format!(
            "{} has no streams",
            handle
        )))
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
