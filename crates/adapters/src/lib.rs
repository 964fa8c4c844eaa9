// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Process backends: the transports that actually start, probe and kill
//! the processes behind submitted jobs.

mod env;
pub mod process;
pub mod subprocess;
pub mod traced;

pub use process::{
    LocalProcessAdapter, NoOpProcessAdapter, ProcessAdapter, ProcessError, ProcessHandle,
    Streams, TmuxProcessAdapter,
};
pub use traced::TracedProcess;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeBehavior, FakeProcess, FakeProcessAdapter, ProcessCall};
