// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job descriptions: what to run and under which limits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors found while validating a [`JobDescription`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptionError {
    /// Required information is absent
    #[error("incomplete job description: {0}")]
    Incomplete(String),
    /// A field holds a value outside its allowed range
    #[error("invalid job description: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl DescriptionError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DescriptionError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Description of a job to run.
///
/// The engine stores its own copy at submit time; mutating the caller's
/// value afterwards has no effect on the submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDescription {
    pub executable: Option<String>,
    pub arguments: Vec<String>,
    pub environment: BTreeMap<String, String>,
    /// Resolved against the engine's working directory when relative or unset
    pub working_directory: Option<PathBuf>,
    pub stdin: Option<PathBuf>,
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
    /// Target queue; the engine's default queue when unset
    pub queue: Option<String>,
    pub node_count: u32,
    pub processes_per_node: u32,
    pub task_count: u32,
    pub max_memory_mb: Option<u64>,
    /// Wall-clock limit after which a running job is killed
    pub max_runtime_ms: Option<u64>,
    pub interactive: bool,
}

impl Default for JobDescription {
    fn default() -> Self {
        Self {
            executable: None,
            arguments: Vec::new(),
            environment: BTreeMap::new(),
            working_directory: None,
            stdin: None,
            stdout: None,
            stderr: None,
            queue: None,
            node_count: 1,
            processes_per_node: 1,
            task_count: 1,
            max_memory_mb: None,
            max_runtime_ms: None,
            interactive: false,
        }
    }
}

impl JobDescription {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: Some(executable.into()),
            ..Self::default()
        }
    }

    pub fn builder(executable: impl Into<String>) -> JobDescriptionBuilder {
        JobDescriptionBuilder {
            description: Self::new(executable),
        }
    }

    /// Parse a description from TOML text (the `bq run --file` format).
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn max_runtime(&self) -> Option<Duration> {
        self.max_runtime_ms.map(Duration::from_millis)
    }

    /// Check the structural invariants every backend relies on.
    pub fn validate(&self) -> Result<(), DescriptionError> {
        match self.executable.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(DescriptionError::Incomplete(
                    "executable missing".to_string(),
                ))
            }
            Some(_) => {}
        }
        if self.node_count < 1 {
            return Err(DescriptionError::invalid("node_count", "must be at least 1"));
        }
        if self.processes_per_node < 1 {
            return Err(DescriptionError::invalid(
                "processes_per_node",
                "must be at least 1",
            ));
        }
        if self.task_count < 1 {
            return Err(DescriptionError::invalid("task_count", "must be at least 1"));
        }
        if self.max_runtime_ms == Some(0) {
            return Err(DescriptionError::invalid(
                "max_runtime_ms",
                "must be positive when set",
            ));
        }
        if self.max_memory_mb == Some(0) {
            return Err(DescriptionError::invalid(
                "max_memory_mb",
                "must be positive when set",
            ));
        }
        if let Some(key) = self
            .environment
            .keys()
            .find(|k| k.is_empty() || k.contains('='))
        {
            return Err(DescriptionError::invalid(
                "environment",
                format!("has malformed key {:?}", key),
            ));
        }
        Ok(())
    }

    /// Working directory of the job, resolved against `base`.
    pub fn resolve_working_directory(&self, base: &Path) -> PathBuf {
        match &self.working_directory {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        }
    }

    /// Executable and arguments joined for display and logs.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.arguments.len() + 1);
        parts.push(self.executable.clone().unwrap_or_default());
        parts.extend(self.arguments.iter().cloned());
        parts.join(" ")
    }
}

/// Fluent builder for [`JobDescription`].
#[derive(Debug, Clone)]
pub struct JobDescriptionBuilder {
    description: JobDescription,
}

impl JobDescriptionBuilder {
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.description.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.description
            .arguments
            .extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.description
            .environment
            .insert(key.into(), value.into());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.description.working_directory = Some(dir.into());
        self
    }

    pub fn stdin(mut self, path: impl Into<PathBuf>) -> Self {
        self.description.stdin = Some(path.into());
        self
    }

    pub fn stdout(mut self, path: impl Into<PathBuf>) -> Self {
        self.description.stdout = Some(path.into());
        self
    }

    pub fn stderr(mut self, path: impl Into<PathBuf>) -> Self {
        self.description.stderr = Some(path.into());
        self
    }

    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.description.queue = Some(queue.into());
        self
    }

    pub fn node_count(mut self, count: u32) -> Self {
        self.description.node_count = count;
        self
    }

    pub fn processes_per_node(mut self, count: u32) -> Self {
        self.description.processes_per_node = count;
        self
    }

    pub fn task_count(mut self, count: u32) -> Self {
        self.description.task_count = count;
        self
    }

    pub fn max_memory_mb(mut self, mb: u64) -> Self {
        self.description.max_memory_mb = Some(mb);
        self
    }

    pub fn max_runtime(mut self, runtime: Duration) -> Self {
        self.description.max_runtime_ms = Some(runtime.as_millis() as u64);
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.description.interactive = interactive;
        self
    }

    pub fn build(self) -> JobDescription {
        self.description
    }
}

#[cfg(test)]
#[path = "description_tests.rs"]
mod tests;
