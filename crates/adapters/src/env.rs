// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for a single tmux command (default: 10000ms).
pub fn tmux_timeout() -> Duration {
    parse_duration_ms("BQ_TMUX_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}

/// Prefix for tmux session names (default: `bq`).
pub fn tmux_session_prefix() -> String {
    std::env::var("BQ_TMUX_PREFIX")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "bq".to_string())
}
