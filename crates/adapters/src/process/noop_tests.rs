// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn noop_jobs_finish_immediately_with_success() {
    let adapter = NoOpProcessAdapter::new();
    let handle = adapter.start(&JobDescription::new("anything")).await.unwrap();

    assert_eq!(handle.as_str(), "noop-1");
    assert!(adapter.is_done(&handle).await.unwrap());
    assert_eq!(adapter.exit_code(&handle).await.unwrap(), Some(0));
    assert!(adapter.kill(&handle).await.is_ok());
    assert!(adapter.cleanup(&handle).await.is_ok());
}

#[tokio::test]
async fn noop_handles_are_unique_across_clones() {
    let adapter = NoOpProcessAdapter::new();
    let clone = adapter.clone();
    let a = adapter.start(&JobDescription::new("a")).await.unwrap();
    let b = clone.start(&JobDescription::new("b")).await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn noop_has_no_streams() {
    let adapter = NoOpProcessAdapter::new();
    let handle = adapter.start(&JobDescription::new("cat")).await.unwrap();
    assert!(matches!(
        adapter.streams(&handle).await,
        Err(ProcessError::Unsupported(_))
    ));
}
