// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux session adapter
//!
//! Each job runs in its own detached tmux session. The session keeps its
//! pane after the command exits (`remain-on-exit`), which is how the exit
//! status is read back. The option is set on a placeholder shell before the
//! job command is respawned into the pane, so even instant exits are kept.

use super::{ProcessAdapter, ProcessError, ProcessHandle, Streams};
use crate::env;
use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use bq_core::JobDescription;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// Tmux-based process adapter
#[derive(Clone)]
pub struct TmuxProcessAdapter {
    prefix: String,
    timeout: Duration,
    next_id: Arc<AtomicU64>,
}

impl Default for TmuxProcessAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TmuxProcessAdapter {
    pub fn new() -> Self {
        Self::with_prefix(env::tmux_session_prefix())
    }

    /// Use a custom session name prefix (sessions are `<prefix>-<pid>-<n>`)
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            timeout: env::tmux_timeout(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn next_session_name(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}-{}", self.prefix, std::process::id(), n)
    }

    async fn tmux_output(
        &self,
        args: &[&str],
        description: &str,
    ) -> Result<std::process::Output, ProcessError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        let output = run_with_timeout(cmd, self.timeout, description)
            .await
            .map_err(ProcessError::CommandFailed)?;
        if !output.status.success() {
            let session_id = args
                .windows(2)
                .find(|w| w[0] == "-t")
                .map(|w| w[1])
                .unwrap_or("unknown");
            return Err(ProcessError::NotFound(session_id.to_string()));
        }
        Ok(output)
    }

    async fn pane_field(&self, session: &str, field: &str) -> Result<String, ProcessError> {
        let output = self
            .tmux_output(
                &["display-message", "-t", session, "-p", field],
                "tmux display-message",
            )
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn kill_session(&self, session: &str) {
        // Ignore failure - session might already be gone, which is fine
        let mut cmd = Command::new("tmux");
        cmd.args(["kill-session", "-t", session]);
        let _ = run_with_timeout(cmd, self.timeout, "tmux kill-session").await;
    }
}

/// Quote a word for POSIX `sh`.
pub(crate) fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Build the shell command line run inside the pane.
pub(crate) fn pane_command(description: &JobDescription) -> String {
    let mut line = String::from("exec");
    for word in description
        .executable
        .iter()
        .chain(description.arguments.iter())
    {
        line.push(' ');
        line.push_str(&shell_quote(word));
    }
    let redirects = [
        ("<", &description.stdin),
        (">", &description.stdout),
        ("2>", &description.stderr),
    ];
    for (op, path) in redirects {
        if let Some(path) = path {
            line.push_str(&format!(" {}{}", op, shell_quote(&path.to_string_lossy())));
        }
    }
    line
}

#[async_trait]
impl ProcessAdapter for TmuxProcessAdapter {
    fn name(&self) -> &str {
        "tmux"
    }

    fn check_description(&self, description: &JobDescription) -> Result<(), ProcessError> {
        if description.interactive {
            return Err(ProcessError::InvalidDescription(
                "tmux sessions do not expose job streams".to_string(),
            ));
        }
        if description.node_count > 1 {
            return Err(ProcessError::InvalidDescription(format!(
                "tmux sessions run on a single node, got node_count {}",
                description.node_count
            )));
        }
        Ok(())
    }

    async fn start(&self, description: &JobDescription) -> Result<ProcessHandle, ProcessError> {
        let cwd = description
            .working_directory
            .as_deref()
            .unwrap_or_else(|| Path::new("."));
        // Precondition: cwd must exist
        if !cwd.is_dir() {
            return Err(ProcessError::StartFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }
        let cwd = cwd.to_string_lossy();
        let session = self.next_session_name();

        self.tmux_output(
            &["new-session", "-d", "-s", &session, "-c", &cwd],
            "tmux new-session",
        )
        .await
        .map_err(|e| ProcessError::StartFailed(e.to_string()))?;

        let prepared = self
            .tmux_output(
                &["set-option", "-w", "-t", &session, "remain-on-exit", "on"],
                "tmux set-option",
            )
            .await;
        if let Err(e) = prepared {
            self.kill_session(&session).await;
            return Err(ProcessError::StartFailed(e.to_string()));
        }

        let env: Vec<String> = description
            .environment
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        let command = pane_command(description);
        let mut args: Vec<&str> = vec!["respawn-pane", "-k", "-t", &session, "-c", &cwd];
        for pair in &env {
            args.push("-e");
            args.push(pair);
        }
        args.push(&command);

        let mut cmd = Command::new("tmux");
        cmd.args(&args);
        let output = run_with_timeout(cmd, self.timeout, "tmux respawn-pane")
            .await
            .map_err(ProcessError::StartFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session, stderr = %stderr, "tmux respawn-pane failed");
            self.kill_session(&session).await;
            return Err(ProcessError::StartFailed(stderr.to_string()));
        }

        Ok(ProcessHandle::new(session))
    }

    async fn is_done(&self, handle: &ProcessHandle) -> Result<bool, ProcessError> {
        match self.pane_field(handle.as_str(), "#{pane_dead}").await {
            Ok(dead) => Ok(dead == "1"),
            // Session vanished underneath us (killed externally): nothing left to wait for
            Err(ProcessError::NotFound(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    async fn exit_code(&self, handle: &ProcessHandle) -> Result<Option<i32>, ProcessError> {
        match self.pane_field(handle.as_str(), "#{pane_dead_status}").await {
            Ok(status) => Ok(status.parse::<i32>().ok()),
            Err(ProcessError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn kill(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        self.kill_session(handle.as_str()).await;
        Ok(())
    }

    async fn streams(&self, handle: &ProcessHandle) -> Result<Streams, ProcessError> {
        Err(ProcessError::Unsupported(format!(
            "tmux session {} has no attachable streams",
            handle
        )))
    }

    async fn cleanup(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        self.kill_session(handle.as_str()).await;
        Ok(())
    }

    fn info(&self, handle: &ProcessHandle) -> BTreeMap<String, String> {
        BTreeMap::from([("session".to_string(), handle.to_string())])
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
