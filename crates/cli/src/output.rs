// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bq_core::{JobStatus, QueuePolicy, QueueStatus};
use clap::ValueEnum;
use std::io::Write;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a job's final status to stdout
pub fn print_job_status(status: &JobStatus, format: OutputFormat) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    write_job_status(&mut out, status, format)
}

pub fn write_job_status(
    out: &mut impl Write,
    status: &JobStatus,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", status)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(status)?)?,
    }
    Ok(())
}

/// Print queue statuses as a table (text) or an array (json)
pub fn print_queue_statuses(statuses: &[QueueStatus], format: OutputFormat) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    write_queue_statuses(&mut out, statuses, format)
}

pub fn write_queue_statuses(
    out: &mut impl Write,
    statuses: &[QueueStatus],
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        writeln!(out, "{}", serde_json::to_string_pretty(statuses)?)?;
        return Ok(());
    }

    let header = ["QUEUE", "POLICY", "SLOTS", "RUNNING", "WAITING"];
    let rows: Vec<[String; 5]> = statuses
        .iter()
        .map(|s| {
            [
                s.name.clone(),
                policy_name(&s.policy).to_string(),
                s.max_concurrent()
                    .map_or_else(|| "-".to_string(), |n| n.to_string()),
                s.running.to_string(),
                s.waiting.to_string(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let render = |cells: Vec<&str>| {
        let last = cells.len() - 1;
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == last {
                    cell.to_string()
                } else {
                    format!("{:<width$}", cell, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    writeln!(out, "{}", render(header.to_vec()))?;
    for row in &rows {
        writeln!(out, "{}", render(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

fn policy_name(policy: &QueuePolicy) -> &'static str {
    match policy {
        QueuePolicy::Unbounded => "unbounded",
        QueuePolicy::Single => "single",
        QueuePolicy::Bounded(_) => "bounded",
    }
}
