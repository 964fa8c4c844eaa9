// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bq job queue engine
//!
//! Accepts job descriptions, holds them in named queues with admission
//! control, runs them through a process backend and reports their status.

mod engine;
mod error;
mod executor;
mod queue;
mod registry;

pub use engine::JobQueueEngine;
pub use error::EngineError;
pub use executor::JobExecutor;

// Cancellation tokens appear in the waiting API
pub use tokio_util::sync::CancellationToken;
