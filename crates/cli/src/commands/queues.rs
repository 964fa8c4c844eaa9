// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bq queues [names]` - Show queue policies and occupancy

use anyhow::Result;
use bq_adapters::NoOpProcessAdapter;
use bq_core::EngineConfig;
use bq_engine::JobQueueEngine;
use clap::Args;

use crate::output::{print_queue_statuses, OutputFormat};

#[derive(Args)]
pub struct QueuesArgs {
    /// Queues to show [default: all]
    pub names: Vec<String>,
}

pub async fn handle(args: QueuesArgs, config: EngineConfig, format: OutputFormat) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let engine = JobQueueEngine::new(NoOpProcessAdapter::new(), config, cwd)?;

    let names: Vec<&str> = args.names.iter().map(String::as_str).collect();
    let statuses = engine
        .get_queue_statuses(&names)
        .into_iter()
        .collect::<Result<Vec<_>, _>>();
    engine.end();

    print_queue_statuses(&statuses?, format)
}
