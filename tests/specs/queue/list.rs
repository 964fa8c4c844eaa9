//! `bq queues` specs

use crate::prelude::*;

#[test]
fn lists_builtin_queues() {
    let temp = Project::empty();
    temp.bq().args(&["queues"]).passes().stdout_eq(
        "\
QUEUE      POLICY     SLOTS  RUNNING  WAITING
single     single     1      0        0
multi      bounded    4      0        0
unlimited  unbounded  -      0        0
",
    );
}

#[test]
fn configured_queues_are_listed_after_builtins() {
    let temp = Project::empty();
    temp.config(
        r#"
max_concurrent_jobs = 2

[[queues]]
name = "gpu"
max_concurrent = 1

[[queues]]
name = "bulk"
max_concurrent = 0
"#,
    );
    temp.bq().args(&["queues"]).passes().stdout_eq(
        "\
QUEUE      POLICY     SLOTS  RUNNING  WAITING
single     single     1      0        0
multi      bounded    2      0        0
unlimited  unbounded  -      0        0
gpu        single     1      0        0
bulk       unbounded  -      0        0
",
    );
}

#[test]
fn env_override_changes_multi_bound() {
    let temp = Project::empty();
    let run = temp
        .bq()
        .env("BQ_MAX_CONCURRENT_JOBS", "8")
        .args(&["-o", "json", "queues", "multi"])
        .passes();

    let queues = run.json();
    assert_eq!(queues.as_array().unwrap().len(), 1);
    assert_eq!(queues[0]["name"], "multi");
    assert_eq!(queues[0]["policy"]["slots"], 8);
    assert_eq!(queues[0]["info"]["polling_delay_ms"], "100");
}

#[test]
fn unknown_queue_name_fails() {
    let temp = Project::empty();
    temp.bq()
        .args(&["queues", "single", "gpu"])
        .exits_with(1)
        .stderr_has("no such queue: gpu");
}
