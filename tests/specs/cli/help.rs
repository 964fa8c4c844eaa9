//! CLI help specs

use crate::prelude::*;

#[test]
fn no_subcommand_prints_help() {
    cli()
        .passes()
        .stdout_has("Usage: bq")
        .stdout_has("run")
        .stdout_has("queues");
}

#[test]
fn run_help_lists_options() {
    cli()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--queue")
        .stdout_has("--timeout-ms")
        .stdout_has("--backend");
}
