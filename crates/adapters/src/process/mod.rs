// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker process adapters

mod os;

pub use os::OsProcessAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcess, FakeProcessAdapter, ProcessCall, SpawnBehavior};

use crate::output::OutputBuffer;
use async_trait::async_trait;
use bf_core::{Secret, WorkerExit};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("spawned {0} but it has no pid")]
    NoPid(String),
    #[error("failed to send {signal} to pid {pid}: {message}")]
    Signal {
        pid: u32,
        signal: Signal,
        message: String,
    },
}

/// Signals the supervisor sends to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Graceful termination request (SIGTERM).
    Terminate,
    /// Forceful kill (SIGKILL).
    Kill,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Terminate => f.write_str("SIGTERM"),
            Signal::Kill => f.write_str("SIGKILL"),
        }
    }
}

/// One argv entry. Secret entries are masked whenever the command is shown.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArg {
    Plain(String),
    Secret(Secret),
}

impl CommandArg {
    pub fn expose(&self) -> &str {
        match self {
            CommandArg::Plain(s) => s,
            CommandArg::Secret(s) => s.expose(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            CommandArg::Plain(s) => s.clone(),
            CommandArg::Secret(s) => s.masked(),
        }
    }
}

impl From<&str> for CommandArg {
    fn from(s: &str) -> Self {
        CommandArg::Plain(s.to_string())
    }
}

impl From<String> for CommandArg {
    fn from(s: String) -> Self {
        CommandArg::Plain(s)
    }
}

/// Fully resolved worker invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<CommandArg>,
    /// Extra environment for the child only. Values are always secret.
    pub env: Vec<(String, Secret)>,
    pub cwd: Option<PathBuf>,
    /// Capacity of each captured stream.
    pub output_capacity: usize,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            output_capacity: crate::output::DEFAULT_OUTPUT_CAPACITY,
        }
    }

    pub fn arg(mut self, arg: impl Into<CommandArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn secret_arg(mut self, secret: Secret) -> Self {
        self.args.push(CommandArg::Secret(secret));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: Secret) -> Self {
        self.env.push((key.into(), value));
        self
    }

    /// Raw argv values, for handing to the OS.
    pub fn exposed_args(&self) -> Vec<&str> {
        self.args.iter().map(CommandArg::expose).collect()
    }

    /// Command line safe for logs: secret args masked, env values omitted.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + self.env.len() + 1);
        parts.extend(self.env.iter().map(|(k, _)| format!("{k}=****")));
        parts.push(self.program.display().to_string());
        parts.extend(self.args.iter().map(CommandArg::display));
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ExitState {
    exit: WorkerExit,
    /// Captured output is complete.
    settled: bool,
}

/// Publishing side of an [`ExitWatch`], held by whoever reaps the child.
pub struct ExitSender(watch::Sender<Option<ExitState>>);

impl ExitSender {
    /// The pid is reaped but output may still be draining. Liveness flips
    /// immediately, since the pid may be reused from here on.
    pub fn reaped(&self, exit: WorkerExit) {
        self.0.send_replace(Some(ExitState {
            exit,
            settled: false,
        }));
    }

    /// The process exited and its output is complete.
    pub fn exited(&self, exit: WorkerExit) {
        self.0.send_replace(Some(ExitState {
            exit,
            settled: true,
        }));
    }

    pub fn has_exited(&self) -> bool {
        self.0.borrow().is_some()
    }
}

/// Observer for a worker's exit; cloneable and non-blocking to probe.
#[derive(Clone)]
pub struct ExitWatch(watch::Receiver<Option<ExitState>>);

impl fmt::Debug for ExitWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExitWatch").field(&self.probe()).finish()
    }
}

impl ExitWatch {
    pub fn channel() -> (ExitSender, ExitWatch) {
        let (tx, rx) = watch::channel(None);
        (ExitSender(tx), ExitWatch(rx))
    }

    /// Non-blocking liveness probe: `None` while the process runs.
    ///
    /// If the reaper went away without publishing, the process is no longer
    /// observable and is reported as exited with unknown status.
    pub fn probe(&self) -> Option<WorkerExit> {
        let current = *self.0.borrow();
        match current {
            Some(state) => Some(state.exit),
            None if self.0.has_changed().is_err() => Some(WorkerExit::default()),
            None => None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.probe().is_none()
    }

    /// Wait until the process exits.
    pub async fn wait(&self) -> WorkerExit {
        let mut rx = self.0.clone();
        let result = rx.wait_for(Option::is_some).await.map(|state| *state);
        match result {
            Ok(Some(state)) => state.exit,
            _ => self.probe().unwrap_or_default(),
        }
    }

    /// Wait up to `timeout`; `None` if the process is still running.
    pub async fn wait_timeout(&self, timeout: Duration) -> Option<WorkerExit> {
        tokio::time::timeout(timeout, self.wait()).await.ok()
    }

    /// Wait until the exit is published with complete output, or the reaper
    /// is gone.
    pub async fn settled(&self) {
        let mut rx = self.0.clone();
        let _ = rx
            .wait_for(|state| state.is_some_and(|s| s.settled))
            .await;
    }
}

/// A started worker: its pid, captured streams, and exit observer.
#[derive(Debug, Clone)]
pub struct SpawnedWorker {
    pub pid: u32,
    pub stdout: OutputBuffer,
    pub stderr: OutputBuffer,
    pub exit: ExitWatch,
}

/// Adapter for starting and signalling OS processes.
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Start `cmd` with stdout/stderr captured. Must not wait for exit.
    async fn spawn(&self, cmd: &WorkerCommand) -> Result<SpawnedWorker, ProcessError>;

    /// Deliver `signal` to `pid`. Signalling a process that is already gone
    /// is not an error.
    async fn signal(&self, pid: u32, signal: Signal) -> Result<(), ProcessError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
