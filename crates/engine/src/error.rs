// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the job queue engine

use bq_adapters::ProcessError;
use bq_core::{ConfigError, DescriptionError};
use thiserror::Error;

/// Errors raised synchronously by engine operations.
///
/// Failures during a job's asynchronous lifetime are never raised here;
/// they are recorded on the job and reported through its status.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid job description: {0}")]
    InvalidJobDescription(String),
    #[error("incomplete job description: {0}")]
    IncompleteJobDescription(String),
    #[error("no such queue: {0}")]
    NoSuchQueue(String),
    #[error("no such job: {0}")]
    NoSuchJob(String),
    #[error("job queue engine is closed")]
    Closed,
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("process backend error: {0}")]
    Backend(#[from] ProcessError),
}

impl From<DescriptionError> for EngineError {
    fn from(err: DescriptionError) -> Self {
        match err {
            DescriptionError::Incomplete(reason) => EngineError::IncompleteJobDescription(reason),
            DescriptionError::Invalid { field, reason } => {
                EngineError::InvalidJobDescription(format!("{} {}", field, reason))
            }
        }
    }
}
