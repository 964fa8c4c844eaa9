// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bq-core: data model shared by the job queue engine, its process
//! adapters and the `bq` CLI.

pub mod config;
pub mod description;
mod env;
pub mod job;
pub mod state;
pub mod status;

pub use config::{ConfigError, EngineConfig, QueueConfig};
pub use description::{DescriptionError, JobDescription, JobDescriptionBuilder};
pub use job::{Job, JobId};
pub use state::JobState;
pub use status::{JobError, JobStatus, QueuePolicy, QueueStatus};

/// Name of the queue that admits one job at a time.
pub const SINGLE_QUEUE: &str = "single";
/// Name of the queue bounded by `max_concurrent_jobs`.
pub const MULTI_QUEUE: &str = "multi";
/// Name of the queue without an admission bound.
pub const UNLIMITED_QUEUE: &str = "unlimited";
