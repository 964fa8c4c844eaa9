//! Helpers for black-box specs of the bq binary.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Fastest polling the engine accepts
const BQ_POLLING_DELAY_MS: &str = "100";

// Parent overrides would change queue bounds under test
const SCRUBBED_ENV: [&str; 3] = ["BQ_MAX_CONCURRENT_JOBS", "BQ_MAX_HISTORY", "RUST_LOG"];

/// Invocation of bq outside any project directory.
pub fn cli() -> CliBuilder {
    CliBuilder {
        args: Vec::new(),
        dir: None,
        envs: vec![("BQ_POLLING_DELAY_MS".into(), BQ_POLLING_DELAY_MS.into())],
    }
}

pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        let value = value.as_ref().to_string_lossy().into_owned();
        self.envs.push((key.to_string(), value));
        self
    }

    /// Run and require exit code 0.
    pub fn passes(self) -> RunAssert {
        self.exits_with(0)
    }

    /// Run and require exactly `code`.
    pub fn exits_with(self, code: i32) -> RunAssert {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin("bq"));
        cmd.args(&self.args);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        for key in SCRUBBED_ENV {
            cmd.env_remove(key);
        }
        cmd.envs(self.envs);

        let run = RunAssert {
            output: cmd.output().expect("bq should spawn"),
        };
        assert_eq!(
            run.output.status.code(),
            Some(code),
            "bq {}\nstdout: {}\nstderr: {}",
            self.args.join(" "),
            run.text(&run.output.stdout),
            run.text(&run.output.stderr)
        );
        run
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    fn text(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    /// Stdout of a `-o json` run.
    pub fn json(&self) -> serde_json::Value {
        let stdout = self.text(&self.output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON: {e}\nstdout: {stdout}"))
    }

    /// Exact stdout comparison with a line diff on mismatch.
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.text(&self.output.stdout), expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.text(&self.output.stdout);
        assert!(stdout.contains(expected), "stdout lacks {expected:?}\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.text(&self.output.stderr);
        assert!(stderr.contains(expected), "stderr lacks {expected:?}\nstderr: {stderr}");
        self
    }
}

/// Scratch working directory plus an isolated `XDG_CONFIG_HOME`.
pub struct Project {
    dir: tempfile::TempDir,
    config_home: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            config_home: tempfile::tempdir().unwrap(),
        }
    }

    /// Parent directories are created as needed.
    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        write_under(self.dir.path(), path, content);
    }

    pub fn read(&self, path: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.dir.path().join(path)).unwrap()
    }

    /// Contents of `bq/config.toml` under the isolated config home.
    pub fn config(&self, content: &str) {
        write_under(self.config_home.path(), "bq/config.toml", content);
    }

    pub fn bq(&self) -> CliBuilder {
        let mut builder = cli().env("XDG_CONFIG_HOME", self.config_home.path());
        builder.dir = Some(self.dir.path().to_path_buf());
        builder
    }
}

fn write_under(root: &Path, path: impl AsRef<Path>, content: &str) {
    let path = root.join(path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
