// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process backend adapters

mod local;
mod noop;
mod tmux;

pub use local::LocalProcessAdapter;
pub use noop::NoOpProcessAdapter;
pub use tmux::TmuxProcessAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBehavior, FakeProcess, FakeProcessAdapter, ProcessCall};

use async_trait::async_trait;
use bq_core::JobDescription;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("process not found: {0}")]
    NotFound(String),
    #[error("start failed: {0}")]
    StartFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("job description not supported: {0}")]
    InvalidDescription(String),
    #[error("not supported: {0}")]
    Unsupported(String),
}

/// Opaque reference to a process started by an adapter.
///
/// Only meaningful to the adapter that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessHandle(String);

impl ProcessHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standard streams of an interactive process.
pub struct Streams {
    pub stdin: Box<dyn AsyncWrite + Send + Unpin>,
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub stderr: Box<dyn AsyncRead + Send + Unpin>,
}

impl fmt::Debug for Streams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streams").finish_non_exhaustive()
    }
}

/// Transport that starts and monitors the process behind a job.
///
/// Neither local children nor remote sessions deliver completion
/// callbacks, so completion is observed by polling [`is_done`]. All
/// methods must be safe to call concurrently for different handles, and
/// `kill` concurrently with `is_done` for the same handle.
///
/// [`is_done`]: ProcessAdapter::is_done
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Short adapter name, used as the scheduler name of its jobs
    fn name(&self) -> &str;

    /// Reject descriptions this transport cannot run.
    /// Default implementation accepts everything.
    fn check_description(&self, _description: &JobDescription) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Start a process for the description
    async fn start(&self, description: &JobDescription) -> Result<ProcessHandle, ProcessError>;

    /// Non-blocking check whether the process has finished
    async fn is_done(&self, handle: &ProcessHandle) -> Result<bool, ProcessError>;

    /// Exit code of a finished process.
    ///
    /// Returns `None` while running or when the transport lost the code.
    async fn exit_code(&self, handle: &ProcessHandle) -> Result<Option<i32>, ProcessError>;

    /// Best-effort termination; succeeds for already finished processes
    async fn kill(&self, handle: &ProcessHandle) -> Result<(), ProcessError>;

    /// Take the standard streams of an interactive process
    async fn streams(&self, handle: &ProcessHandle) -> Result<Streams, ProcessError>;

    /// Release bookkeeping for a process whose outcome has been recorded.
    /// Default implementation is a no-op.
    async fn cleanup(&self, _handle: &ProcessHandle) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Transport-specific details reported in job statuses
    fn info(&self, handle: &ProcessHandle) -> BTreeMap<String, String> {
        BTreeMap::from([("process".to_string(), handle.to_string())])
    }
}
