//! `bq run` specs
//!
//! A submitted job is waited for and its exit code becomes bq's exit code.

use crate::prelude::*;

#[test]
fn successful_job_exits_zero() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run", "--", "true"])
        .passes()
        .stdout_eq("local-1 DONE exit=0\n");
}

#[test]
fn failing_job_exit_code_is_propagated() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run", "--", "/bin/false"])
        .exits_with(1)
        .stdout_eq("local-1 DONE exit=1\n");
}

#[test]
fn arbitrary_exit_code_is_propagated() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run", "--", "sh", "-c", "exit 7"])
        .exits_with(7);
}

#[test]
fn json_output_carries_state_and_exit_code() {
    let temp = Project::empty();
    let run = temp
        .bq()
        .args(&["-o", "json", "run", "--queue", "multi", "--", "true"])
        .passes();

    let status = run.json();
    assert_eq!(status["state"], "DONE");
    assert_eq!(status["exit_code"], 0);
    assert_eq!(status["job"]["queue"], "multi");
    assert_eq!(status["job"]["scheduler"], "local");
}

#[test]
fn redirects_and_environment_reach_the_job() {
    let temp = Project::empty();
    temp.file("input.txt", "from stdin\n");
    temp.bq()
        .args(&[
            "run",
            "--env",
            "GREETING=hello",
            "--stdin",
            "input.txt",
            "--stdout",
            "out.txt",
            "--",
            "sh",
            "-c",
            "echo $GREETING; cat",
        ])
        .passes();

    assert_eq!(temp.read("out.txt"), "hello\nfrom stdin\n");
}

#[test]
fn job_runs_in_requested_directory() {
    let temp = Project::empty();
    temp.file("sub/marker", "");
    temp.bq()
        .args(&["run", "--cwd", "sub", "--stdout", "pwd.txt", "--", "pwd"])
        .passes();

    // Redirect paths are relative to the job's working directory
    let pwd = temp.read("sub/pwd.txt");
    assert!(pwd.trim_end().ends_with("/sub"), "pwd was {pwd}");
}

#[test]
fn job_description_file_is_used() {
    let temp = Project::empty();
    temp.file(
        "job.toml",
        r#"
executable = "sh"
arguments = ["-c", "exit 4"]
queue = "unlimited"
"#,
    );
    temp.bq()
        .args(&["run", "--file", "job.toml"])
        .exits_with(4)
        .stdout_eq("local-1 DONE exit=4\n");
}

#[test]
fn noop_backend_completes_immediately() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run", "--backend", "noop", "--", "/does/not/exist"])
        .passes()
        .stdout_eq("noop-1 DONE exit=0\n");
}

#[test]
fn missing_executable_is_an_error_state() {
    let temp = Project::empty();
    temp.bq()
        .args(&["run", "--", "/does/not/exist"])
        .exits_with(1)
        .stdout_has("local-1 ERROR")
        .stdout_has("failed to start process");
}
