// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_id_display() {
    assert_eq!(JobId::new(42).to_string(), "42");
}

#[test]
fn job_ids_order_by_sequence() {
    assert!(JobId::new(1) < JobId::new(2));
    assert_eq!(JobId::from(7), JobId::new(7));
}

#[test]
fn job_display_includes_scheduler() {
    let job = Job::new(JobId::new(3), "local", "single");
    assert_eq!(job.to_string(), "local-3");
}

#[test]
fn job_handles_compare_by_value() {
    let a = Job::new(JobId::new(1), "local", "multi");
    let b = Job::new(JobId::new(1), "local", "multi");
    let c = Job::new(JobId::new(1), "tmux", "multi");

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn job_serde() {
    let job = Job::new(JobId::new(9), "local", "unlimited").interactive(true);
    let json = serde_json::to_string(&job).unwrap();
    assert_eq!(
        json,
        r#"{"id":9,"scheduler":"local","queue":"unlimited","interactive":true}"#
    );

    let parsed: Job = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, job);
}
