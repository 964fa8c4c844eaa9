// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;

/// Default config location: `$XDG_CONFIG_HOME/bq/config.toml` (or the
/// platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bq").join("config.toml"))
}

/// Log filter directives; falls back to `warn` when unset
pub fn log_filter() -> Option<String> {
    std::env::var("RUST_LOG").ok().filter(|s| !s.is_empty())
}
