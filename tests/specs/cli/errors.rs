//! CLI error handling specs
//!
//! Verify error messages for rejected submissions and bad arguments.

use crate::prelude::*;

#[test]
fn run_without_command_is_incomplete() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run"])
        .exits_with(1)
        .stderr_has("incomplete job description");
}

#[test]
fn run_unknown_queue_shows_error() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run", "--queue", "gpu", "--", "true"])
        .exits_with(1)
        .stderr_has("no such queue: gpu");
}

#[test]
fn run_zero_node_count_is_invalid() {
    let temp = Project::empty();
    temp.file("job.toml", "executable = \"true\"\nnode_count = 0\n");
    temp.bq()
        .args(&["run", "--file", "job.toml"])
        .exits_with(1)
        .stderr_has("invalid job description");
}

#[test]
fn local_backend_rejects_multi_node_jobs() {
    let temp = Project::empty();
    temp.file("job.toml", "executable = \"true\"\nnode_count = 4\n");
    temp.bq()
        .args(&["run", "--file", "job.toml"])
        .exits_with(1)
        .stderr_has("invalid job description");
}

#[test]
fn malformed_env_flag_is_a_usage_error() {
    cli()
        .args(&["run", "--env", "NOEQUALS", "--", "true"])
        .exits_with(2)
        .stderr_has("no `=` found");
}

#[test]
fn missing_config_file_shows_error() {
    let temp = Project::empty();
    temp.bq()
        .args(&["--config", "missing.toml", "queues"])
        .exits_with(1)
        .stderr_has("config file not found: missing.toml");
}

#[test]
fn invalid_config_is_rejected() {
    let temp = Project::empty();
    temp.config("max_history = 0\n");
    temp.bq()
        .args(&["queues"])
        .exits_with(1)
        .stderr_has("max_history must be at least 1");
}
