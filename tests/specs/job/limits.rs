//! Timeout and runtime-limit specs

use crate::prelude::*;

#[test]
fn wait_timeout_cancels_job_and_exits_124() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run", "--timeout-ms", "300", "--", "sleep", "30"])
        .exits_with(124)
        .stdout_eq("local-1 KILLED\n");
}

#[test]
fn max_runtime_kills_job() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run", "--max-runtime-ms", "200", "--", "sleep", "30"])
        .exits_with(1)
        .stdout_eq("local-1 KILLED (process exceeded its maximum runtime of 200ms)\n");
}

#[test]
fn job_finishing_before_timeout_is_not_cancelled() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run", "--timeout-ms", "5000", "--", "true"])
        .passes()
        .stdout_eq("local-1 DONE exit=0\n");
}
