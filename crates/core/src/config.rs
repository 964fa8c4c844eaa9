// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! Loaded from TOML, then adjusted by `BQ_*` environment overrides, then
//! validated. Every field has a default so an empty file is a valid config.

use crate::env;
use crate::{MULTI_QUEUE, SINGLE_QUEUE, UNLIMITED_QUEUE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// An additional named queue declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    pub name: String,
    /// Maximum running jobs; 0 means unbounded
    #[serde(default)]
    pub max_concurrent: usize,
}

/// Tuning knobs of a job queue engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Cycle time of each queue poller and of blocking waits
    pub polling_delay_ms: u64,
    /// Slot count of the `multi` queue
    pub max_concurrent_jobs: usize,
    /// Number of finished jobs kept queryable
    pub max_history: usize,
    /// Extra queues beyond `single`, `multi` and `unlimited`
    pub queues: Vec<QueueConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            polling_delay_ms: Self::DEFAULT_POLLING_DELAY_MS,
            max_concurrent_jobs: Self::DEFAULT_MAX_CONCURRENT_JOBS,
            max_history: Self::DEFAULT_MAX_HISTORY,
            queues: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub const DEFAULT_POLLING_DELAY_MS: u64 = 1000;
    pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;
    pub const DEFAULT_MAX_HISTORY: usize = 1000;
    pub const MIN_POLLING_DELAY_MS: u64 = 100;
    pub const MAX_POLLING_DELAY_MS: u64 = 60_000;

    pub fn polling_delay(&self) -> Duration {
        Duration::from_millis(self.polling_delay_ms)
    }

    pub fn with_polling_delay(mut self, delay: Duration) -> Self {
        self.polling_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }

    pub fn with_queue(mut self, name: impl Into<String>, max_concurrent: usize) -> Self {
        self.queues.push(QueueConfig {
            name: name.into(),
            max_concurrent,
        });
        self
    }

    /// Parse configuration from TOML text without env overrides.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file, apply environment overrides and validate.
    ///
    /// A missing file yields the defaults (plus overrides).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `BQ_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(env::process_env)
    }

    /// Apply overrides read through `lookup` (the environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = env::parse_number(&lookup, env::POLLING_DELAY_MS) {
            self.polling_delay_ms = ms;
        }
        if let Some(max) = env::parse_number(&lookup, env::MAX_CONCURRENT_JOBS) {
            self.max_concurrent_jobs = max;
        }
        if let Some(max) = env::parse_number(&lookup, env::MAX_HISTORY) {
            self.max_history = max;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let delay_range = Self::MIN_POLLING_DELAY_MS..=Self::MAX_POLLING_DELAY_MS;
        if !delay_range.contains(&self.polling_delay_ms) {
            return Err(ConfigError::Invalid(format!(
                "polling_delay_ms must be between {} and {}, got {}",
                Self::MIN_POLLING_DELAY_MS,
                Self::MAX_POLLING_DELAY_MS,
                self.polling_delay_ms
            )));
        }
        if self.max_concurrent_jobs < 1 {
            return Err(ConfigError::Invalid(
                "max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        if self.max_history < 1 {
            return Err(ConfigError::Invalid(
                "max_history must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for queue in &self.queues {
            let name = queue.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid("queue name is empty".to_string()));
            }
            if [SINGLE_QUEUE, MULTI_QUEUE, UNLIMITED_QUEUE].contains(&name) {
                return Err(ConfigError::Invalid(format!(
                    "queue '{}' is built in and cannot be redefined",
                    name
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!(
                    "queue '{}' is defined twice",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
