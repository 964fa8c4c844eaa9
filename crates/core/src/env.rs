// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for engine configuration.

/// Overrides `polling_delay_ms`.
pub const POLLING_DELAY_MS: &str = "BQ_POLLING_DELAY_MS";
/// Overrides `max_concurrent_jobs`.
pub const MAX_CONCURRENT_JOBS: &str = "BQ_MAX_CONCURRENT_JOBS";
/// Overrides `max_history`.
pub const MAX_HISTORY: &str = "BQ_MAX_HISTORY";

/// Read a numeric override through `lookup`, ignoring unparsable values.
pub(crate) fn parse_number<T, F>(lookup: &F, var: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(var).and_then(|s| s.trim().parse::<T>().ok())
}

/// Lookup function backed by the process environment.
pub(crate) fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}
