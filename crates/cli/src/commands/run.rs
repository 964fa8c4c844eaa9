// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bq run [options] -- <executable> [args]` - Submit a job and wait for it

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bq_adapters::{
    LocalProcessAdapter, NoOpProcessAdapter, ProcessAdapter, TmuxProcessAdapter, TracedProcess,
};
use bq_core::{EngineConfig, JobDescription, JobState, JobStatus};
use bq_engine::{CancellationToken, JobQueueEngine};
use clap::{Args, ValueEnum};

use crate::exit_error::ExitError;
use crate::output::{print_job_status, OutputFormat};

/// Exit code when the job is still running at `--timeout-ms`
pub const EXIT_TIMED_OUT: i32 = 124;
/// Exit code when the wait is interrupted with Ctrl-C
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum Backend {
    /// Child processes of `bq`
    #[default]
    Local,
    /// One detached tmux session per job
    Tmux,
    /// Completes every job immediately with exit code 0
    Noop,
}

#[derive(Args)]
pub struct RunArgs {
    /// Queue to submit to [default: single]
    #[arg(short, long)]
    pub queue: Option<String>,

    /// Give up waiting after this many milliseconds (0 waits forever)
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub timeout_ms: u64,

    /// Kill the job once it has run this long
    #[arg(long, value_name = "MS")]
    pub max_runtime_ms: Option<u64>,

    /// Process backend
    #[arg(long, value_enum, default_value_t)]
    pub backend: Backend,

    /// Job description file (TOML); command-line options override it
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Environment variable for the job (key=value)
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,

    /// Working directory [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Read the job's stdin from this file
    #[arg(long, value_name = "FILE")]
    pub stdin: Option<PathBuf>,

    /// Write the job's stdout to this file
    #[arg(long, value_name = "FILE")]
    pub stdout: Option<PathBuf>,

    /// Write the job's stderr to this file
    #[arg(long, value_name = "FILE")]
    pub stderr: Option<PathBuf>,

    /// Executable and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

pub(crate) fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid key=value: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl RunArgs {
    /// Build the job description from `--file` and the command-line options.
    pub fn description(&self) -> Result<JobDescription> {
        let mut description = match &self.file {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                JobDescription::from_toml(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => JobDescription::default(),
        };

        if let Some((executable, arguments)) = self.command.split_first() {
            description.executable = Some(executable.clone());
            description.arguments = arguments.to_vec();
        }
        description.environment.extend(self.env.iter().cloned());

        let overrides = [
            (&mut description.working_directory, &self.cwd),
            (&mut description.stdin, &self.stdin),
            (&mut description.stdout, &self.stdout),
            (&mut description.stderr, &self.stderr),
        ];
        for (field, value) in overrides {
            if value.is_some() {
                field.clone_from(value);
            }
        }
        if self.queue.is_some() {
            description.queue.clone_from(&self.queue);
        }
        if self.max_runtime_ms.is_some() {
            description.max_runtime_ms = self.max_runtime_ms;
        }
        Ok(description)
    }
}

pub async fn handle(args: RunArgs, config: EngineConfig, format: OutputFormat) -> Result<()> {
    let description = args.description()?;
    let timeout = Duration::from_millis(args.timeout_ms);

    let code = match args.backend {
        Backend::Local => {
            execute(LocalProcessAdapter::new(), config, &description, timeout, format).await?
        }
        Backend::Tmux => {
            execute(TmuxProcessAdapter::new(), config, &description, timeout, format).await?
        }
        Backend::Noop => {
            execute(NoOpProcessAdapter::new(), config, &description, timeout, format).await?
        }
    };

    if code != 0 {
        return Err(ExitError::silent(code).into());
    }
    Ok(())
}

async fn execute<P: ProcessAdapter>(
    adapter: P,
    config: EngineConfig,
    description: &JobDescription,
    timeout: Duration,
    format: OutputFormat,
) -> Result<i32> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let engine = JobQueueEngine::new(TracedProcess::new(adapter), config, cwd)?;
    let job = engine.submit_job(description)?;
    tracing::info!(%job, "submitted");

    let interrupt = CancellationToken::new();
    let listener = tokio::spawn({
        let interrupt = interrupt.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        }
    });

    let status = engine
        .wait_until_done_or_cancelled(&job, timeout, &interrupt)
        .await?;
    listener.abort();

    let (status, code) = if status.is_done() {
        let code = exit_code_for(&status);
        (status, code)
    } else {
        let code = if interrupt.is_cancelled() {
            EXIT_INTERRUPTED
        } else {
            EXIT_TIMED_OUT
        };
        tracing::info!(%job, code, "giving up on job");
        engine.cancel_job(&job)?;
        // The kill is asynchronous; give the run task one cycle to record it
        let status = engine
            .wait_until_done(&job, engine.config().polling_delay())
            .await?;
        (status, code)
    };

    print_job_status(&status, format)?;
    engine.end();
    Ok(code)
}

/// Process exit code reporting a terminal job: its own exit code when it
/// finished normally, 1 when it was killed or failed.
pub fn exit_code_for(status: &JobStatus) -> i32 {
    match (status.state, status.exit_code) {
        (JobState::Done, Some(code)) => code,
        _ => 1,
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
