// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.
//!
//! Provides high-level DSL for testing bf CLI behavior.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Aggressive timeouts for fast tests.
//
// IMPORTANT:
//   Do NOT change these.
//   File a performance bug instead.
const BF_TIMEOUT_CONNECT_MS: &str = "2000";
const BF_TIMEOUT_EXIT_MS: &str = "3000";
const BF_TIMEOUT_IPC_MS: &str = "1000";
const BF_CONNECT_POLL_MS: &str = "5";
const BF_GRACE_MS: &str = "200";
const BF_STOP_TIMEOUT_MS: &str = "500";
const BF_HEALTH_CHECK_MS: &str = "100";

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 3000;

/// Returns the path to a binary, checking llvm-cov target directory first.
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR is stale.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>, so its
    // grandparent is target/debug/ where bf and bfd are built.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn bf_binary() -> PathBuf {
    binary_path("bf")
}

pub fn bfd_binary() -> PathBuf {
    binary_path("bfd")
}

/// Create a CLI builder for bf commands
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            program: bf_binary(),
            args: Vec::new(),
            envs: vec![
                (
                    "BF_DAEMON_BINARY".into(),
                    bfd_binary().to_string_lossy().into(),
                ),
                ("BF_TIMEOUT_CONNECT_MS".into(), BF_TIMEOUT_CONNECT_MS.into()),
                ("BF_TIMEOUT_EXIT_MS".into(), BF_TIMEOUT_EXIT_MS.into()),
                ("BF_TIMEOUT_IPC_MS".into(), BF_TIMEOUT_IPC_MS.into()),
                ("BF_CONNECT_POLL_MS".into(), BF_CONNECT_POLL_MS.into()),
                ("BF_GRACE_MS".into(), BF_GRACE_MS.into()),
                ("BF_STOP_TIMEOUT_MS".into(), BF_STOP_TIMEOUT_MS.into()),
                ("BF_HEALTH_CHECK_MS".into(), BF_HEALTH_CHECK_MS.into()),
            ],
        }
    }

    /// Run the daemon binary instead of the CLI
    pub fn daemon(mut self) -> Self {
        self.program = bfd_binary();
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Build the command without running it
    pub fn command(self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        // Credentials from the parent environment would override the store
        cmd.env_remove("BF_BOT_TOKEN");
        cmd.env_remove("BF_MODEL_KEY");
        cmd.env_remove("BF_WORKER_BINARY");
        cmd.env_remove("BF_WORKER_ENTRY");

        for (key, value) in self.envs {
            cmd.env(key, value);
        }

        cmd
    }

    /// Run and capture output without asserting on the exit code
    pub fn run(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        RunAssert { output }
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let run = self.run();
        assert!(
            run.output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            run.output.status.code(),
            run.stdout(),
            run.stderr()
        );
        run
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let run = self.run();
        assert!(
            !run.output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            run.stdout(),
            run.stderr()
        );
        run
    }

    /// Run and expect a specific exit code
    pub fn exits_with(self, code: i32) -> RunAssert {
        let run = self.run();
        assert_eq!(
            run.output.status.code(),
            Some(code),
            "unexpected exit code\nstdout: {}\nstderr: {}",
            run.stdout(),
            run.stderr()
        );
        run
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Assert stdout equals expected exactly.
    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    /// Assert stderr equals expected exactly.
    pub fn stderr_eq(self, expected: &str) -> Self {
        let stderr = self.stderr();
        similar_asserts::assert_eq!(stderr, expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }

    pub fn stderr_lacks(self, unexpected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            !stderr.contains(unexpected),
            "stderr should not contain '{}'\nstderr: {}",
            unexpected,
            stderr
        );
        self
    }

    /// Parse stdout as JSON
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout()).expect("stdout should be JSON")
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Workspace
// =============================================================================

/// Worker that prints a line and then idles until signalled.
pub const IDLE_WORKER: &str = "echo ready; exec sleep 30";

/// Worker that fails during startup, echoing its bot token to stderr.
pub const CRASHING_WORKER: &str = "echo \"invalid token $BF_BOT_TOKEN\" >&2; exit 3";

/// Isolated state directory with its own daemon.
pub struct Workspace {
    state_dir: tempfile::TempDir,
}

impl Workspace {
    /// Empty state directory; workers run [`IDLE_WORKER`].
    pub fn new() -> Self {
        Self::with_worker(IDLE_WORKER)
    }

    /// State directory whose workers run `script` through `/bin/sh -c`.
    pub fn with_worker(script: &str) -> Self {
        let workspace = Self {
            state_dir: tempfile::tempdir().unwrap(),
        };
        workspace.file(
            "config.toml",
            &format!(
                "[worker]\nprogram = \"/bin/sh\"\nargs = [\"-c\", {}, \"worker\"]\n",
                toml_string(script)
            ),
        );
        workspace
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Write a file into the state directory
    pub fn file(&self, name: &str, content: &str) {
        std::fs::write(self.state_path().join(name), content).unwrap();
    }

    /// Write `tenants.toml` with one active record per ID.
    pub fn tenants(&self, ids: &[&str]) {
        let mut content = String::new();
        for id in ids {
            content.push_str(&format!(
                "[[tenant]]\ntenant_id = \"{id}\"\nbot_token = \"123456:TOKEN{id}\"\nmodel_key = \"sk-key-{id}\"\n\n"
            ));
        }
        self.file("tenants.toml", &content);
    }

    /// Run bf against this state directory
    pub fn bf(&self) -> CliBuilder {
        cli().env("BF_STATE_DIR", self.state_path())
    }

    /// Read the daemon log file contents (for debugging test failures)
    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("daemon.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    pub fn daemon_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.state_path().join("daemon.pid"))
            .ok()?
            .trim()
            .parse()
            .ok()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Always try to stop daemon (no-op if not running)
        let mut cmd = self.bf().args(&["daemon", "stop"]).command();
        cmd.stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        let _ = cmd.status();
    }
}

/// Quote `s` as a TOML basic string.
fn toml_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// True if a process with `pid` exists
pub fn process_alive(pid: u32) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
