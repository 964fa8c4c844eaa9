// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bq - batch queue CLI

mod commands;
mod env;
mod exit_error;
mod logging;
mod output;

use output::OutputFormat;

use anyhow::{Context, Result};
use bq_core::EngineConfig;
use clap::{Parser, Subcommand};
use commands::{queues, run};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bq", version, about = "bq - run commands through a local job queue")]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    /// Engine configuration file [default: $XDG_CONFIG_HOME/bq/config.toml]
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a command, wait for it and exit with its exit code
    Run(run::RunArgs),
    /// Show the configured queues
    Queues(queues::QueuesArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// When the top-level message already contains every cause (thiserror
/// variants with `{0}` and `#[from]`), the chain is dropped. Otherwise the
/// causes are listed below it.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            // No subcommand provided: print help and exit 0
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
    };

    // Held until exit so buffered log lines are flushed
    let _guard = logging::setup_logging(cli.log_file.as_deref())?;
    let config = load_config(cli.config.as_deref())?;

    match command {
        Commands::Run(args) => run::handle(args, config, format).await,
        Commands::Queues(args) => queues::handle(args, config, format).await,
    }
}

/// Load the engine configuration.
///
/// An explicit `--config` file must exist; the default location is optional.
fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => match env::default_config_path() {
            Some(path) => path,
            None => {
                let config = EngineConfig::default().with_env_overrides();
                config.validate()?;
                return Ok(config);
            }
        },
    };
    EngineConfig::load(&path).with_context(|| format!("loading {}", path.display()))
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
