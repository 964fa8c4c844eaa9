// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local subprocess adapter

use super::{ProcessAdapter, ProcessError, ProcessHandle, Streams};
use crate::subprocess::exit_code_of;
use async_trait::async_trait;
use bq_core::JobDescription;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};

struct LocalProcess {
    child: Child,
    pid: Option<u32>,
    exit_code: Option<i32>,
    finished: bool,
}

#[derive(Default)]
struct LocalState {
    processes: HashMap<String, LocalProcess>,
    next_id: u64,
}

/// Runs jobs as children of the current process.
///
/// Children are spawned with `kill_on_drop`, so they outlive engine
/// shutdown but not the last clone of the adapter.
#[derive(Clone, Default)]
pub struct LocalProcessAdapter {
    inner: Arc<Mutex<LocalState>>,
}

impl LocalProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of processes still tracked (started and not cleaned up)
    pub fn tracked(&self) -> usize {
        self.inner.lock().processes.len()
    }

    fn build_command(description: &JobDescription) -> Result<Command, ProcessError> {
        let executable = description
            .executable
            .as_deref()
            .ok_or_else(|| ProcessError::StartFailed("executable missing".to_string()))?;

        let mut cmd = Command::new(executable);
        cmd.args(&description.arguments)
            .envs(&description.environment)
            .kill_on_drop(true);

        if let Some(dir) = &description.working_directory {
            cmd.current_dir(dir);
        }

        if description.interactive {
            cmd.stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        } else {
            let redirect = |path: &Option<PathBuf>, write: bool| match path {
                Some(path) => open_file(&redirect_path(description, path), write).map(Stdio::from),
                None => Ok(Stdio::null()),
            };
            cmd.stdin(redirect(&description.stdin, false)?)
                .stdout(redirect(&description.stdout, true)?)
                .stderr(redirect(&description.stderr, true)?);
        }
        Ok(cmd)
    }
}

/// Relative redirects are relative to the job's working directory
fn redirect_path(description: &JobDescription, path: &Path) -> PathBuf {
    match &description.working_directory {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}

fn open_file(path: &Path, write: bool) -> Result<File, ProcessError> {
    let result = if write {
        File::create(path)
    } else {
        File::open(path)
    };
    result.map_err(|e| ProcessError::StartFailed(format!("{}: {}", path.display(), e)))
}

#[async_trait]
impl ProcessAdapter for LocalProcessAdapter {
    fn name(&self) -> &str {
        "local"
    }

    fn check_description(&self, description: &JobDescription) -> Result<(), ProcessError> {
        if description.node_count > 1 {
            return Err(ProcessError::InvalidDescription(format!(
                "local processes run on a single node, got node_count {}",
                description.node_count
            )));
        }
        Ok(())
    }

    async fn start(&self, description: &JobDescription) -> Result<ProcessHandle, ProcessError> {
        // Precondition: working directory must exist
        if let Some(dir) = &description.working_directory {
            if !dir.is_dir() {
                return Err(ProcessError::StartFailed(format!(
                    "working directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        let mut cmd = Self::build_command(description)?;
        let child = cmd.spawn().map_err(|e| {
            ProcessError::StartFailed(format!(
                "{}: {}",
                description.executable.as_deref().unwrap_or_default(),
                e
            ))
        })?;

        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = format!("local-{}", inner.next_id);
        let pid = child.id();
        inner.processes.insert(
            id.clone(),
            LocalProcess {
                child,
                pid,
                exit_code: None,
                finished: false,
            },
        );
        tracing::debug!(id, pid, "local process spawned");

        Ok(ProcessHandle::new(id))
    }

    async fn is_done(&self, handle: &ProcessHandle) -> Result<bool, ProcessError> {
        let mut inner = self.inner.lock();
        let process = inner
            .processes
            .get_mut(handle.as_str())
            .ok_or_else(|| ProcessError::NotFound(handle.to_string()))?;

        if process.finished {
            return Ok(true);
        }
        match process.child.try_wait() {
            Ok(Some(status)) => {
                process.exit_code = exit_code_of(status);
                process.finished = true;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(ProcessError::CommandFailed(format!(
                "wait on {}: {}",
                handle, e
            ))),
        }
    }

    async fn exit_code(&self, handle: &ProcessHandle) -> Result<Option<i32>, ProcessError> {
        let inner = self.inner.lock();
        let process = inner
            .processes
            .get(handle.as_str())
            .ok_or_else(|| ProcessError::NotFound(handle.to_string()))?;
        Ok(process.exit_code)
    }

    async fn kill(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        let mut inner = self.inner.lock();
        // Already cleaned up - nothing left to kill
        let Some(process) = inner.processes.get_mut(handle.as_str()) else {
            return Ok(());
        };
        if process.finished {
            return Ok(());
        }
        match process.child.start_kill() {
            Ok(()) => Ok(()),
            // Exited but not yet reaped
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(ProcessError::CommandFailed(format!(
                "kill {}: {}",
                handle, e
            ))),
        }
    }

    async fn streams(&self, handle: &ProcessHandle) -> Result<Streams, ProcessError> {
        let mut inner = self.inner.lock();
        let process = inner
            .processes
            .get_mut(handle.as_str())
            .ok_or_else(|| ProcessError::NotFound(handle.to_string()))?;

        match (
            process.child.stdin.take(),
            process.child.stdout.take(),
            process.child.stderr.take(),
        ) {
            (Some(stdin), Some(stdout), Some(stderr)) => Ok(Streams {
                stdin: Box::new(stdin),
                stdout: Box::new(stdout),
                stderr: Box::new(stderr),
            }),
            _ => Err(ProcessError::Unsupported(format!(
                "streams of {} are not available (not interactive or already taken)",
                handle
            ))),
        }
    }

    async fn cleanup(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        self.inner.lock().processes.remove(handle.as_str());
        Ok(())
    }

    fn info(&self, handle: &ProcessHandle) -> BTreeMap<String, String> {
        let mut info = BTreeMap::from([("process".to_string(), handle.to_string())]);
        if let Some(pid) = self
            .inner
            .lock()
            .processes
            .get(handle.as_str())
            .and_then(|p| p.pid)
        {
            info.insert("pid".to_string(), pid.to_string());
        }
        info
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
