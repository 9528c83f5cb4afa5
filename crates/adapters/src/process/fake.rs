// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    ExitSender, ExitWatch, ProcessAdapter, ProcessError, Signal, SpawnedWorker, WorkerCommand,
};
use crate::output::OutputBuffer;
use async_trait::async_trait;
use bf_core::WorkerExit;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// SIGTERM / SIGKILL numbers reported for fake signal deaths.
const SIGTERM: i32 = 15;
const SIGKILL: i32 = 9;

/// Recorded process call
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessCall {
    Spawn { pid: u32, command: String },
    Signal { pid: u32, signal: Signal },
}

/// What the next spawned fake process does.
#[derive(Debug, Clone)]
pub enum SpawnBehavior {
    /// Keep running until signalled.
    Run {
        stdout: String,
        ignore_terminate: bool,
    },
    /// Exit before the launcher's grace probe.
    ExitImmediately {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// `spawn` itself fails (e.g. permission denied).
    Fail(String),
}

impl SpawnBehavior {
    pub fn run() -> Self {
        SpawnBehavior::Run {
            stdout: String::new(),
            ignore_terminate: false,
        }
    }

    pub fn run_with_stdout(stdout: &str) -> Self {
        SpawnBehavior::Run {
            stdout: stdout.to_string(),
            ignore_terminate: false,
        }
    }

    pub fn stubborn() -> Self {
        SpawnBehavior::Run {
            stdout: String::new(),
            ignore_terminate: true,
        }
    }

    pub fn crash(code: i32, stderr: &str) -> Self {
        SpawnBehavior::ExitImmediately {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Fake process state
pub struct FakeProcess {
    pub pid: u32,
    pub command: WorkerCommand,
    pub stdout: OutputBuffer,
    pub stderr: OutputBuffer,
    pub ignore_terminate: bool,
    exit_tx: ExitSender,
}

impl FakeProcess {
    pub fn is_alive(&self) -> bool {
        !self.exit_tx.has_exited()
    }
}

struct FakeProcessState {
    processes: HashMap<u32, FakeProcess>,
    calls: Vec<ProcessCall>,
    next_pid: u32,
    planned: VecDeque<SpawnBehavior>,
    default_behavior: SpawnBehavior,
    signal_failure: Option<String>,
}

/// Fake process adapter for testing
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProcessState {
                processes: HashMap::new(),
                calls: Vec::new(),
                next_pid: 1000,
                planned: VecDeque::new(),
                default_behavior: SpawnBehavior::run(),
                signal_failure: None,
            })),
        }
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behavior for every spawn without a planned one.
    pub fn set_default_behavior(&self, behavior: SpawnBehavior) {
        self.inner.lock().default_behavior = behavior;
    }

    /// Queue a behavior for the next spawn only.
    pub fn push_behavior(&self, behavior: SpawnBehavior) {
        self.inner.lock().planned.push_back(behavior);
    }

    /// Make every later `signal` call fail with `message` (e.g. EPERM).
    pub fn fail_signals(&self, message: &str) {
        self.inner.lock().signal_failure = Some(message.to_string());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, ProcessCall::Spawn { .. }))
            .count()
    }

    pub fn signals(&self) -> Vec<(u32, Signal)> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProcessCall::Signal { pid, signal } => Some((*pid, *signal)),
                _ => None,
            })
            .collect()
    }

    /// Pids of processes that have not exited.
    pub fn live_pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self
            .inner
            .lock()
            .processes
            .values()
            .filter(|p| p.is_alive())
            .map(|p| p.pid)
            .collect();
        pids.sort_unstable();
        pids
    }

    /// Command a process was spawned with.
    pub fn command(&self, pid: u32) -> Option<WorkerCommand> {
        self.inner.lock().processes.get(&pid).map(|p| p.command.clone())
    }

    /// Simulate the process exiting on its own.
    pub fn exit(&self, pid: u32, code: i32) {
        if let Some(process) = self.inner.lock().processes.get(&pid) {
            process.exit_tx.exited(WorkerExit::code(code));
        }
    }

    pub fn write_stdout(&self, pid: u32, text: &str) {
        if let Some(process) = self.inner.lock().processes.get(&pid) {
            process.stdout.append(text.as_bytes());
        }
    }

    pub fn write_stderr(&self, pid: u32, text: &str) {
        if let Some(process) = self.inner.lock().processes.get(&pid) {
            process.stderr.append(text.as_bytes());
        }
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(&self, cmd: &WorkerCommand) -> Result<SpawnedWorker, ProcessError> {
        let mut inner = self.inner.lock();
        let behavior = match inner.planned.pop_front() {
            Some(b) => b,
            None => inner.default_behavior.clone(),
        };

        if let SpawnBehavior::Fail(message) = behavior {
            return Err(ProcessError::Spawn {
                program: cmd.program.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, message),
            });
        }

        let pid = inner.next_pid;
        inner.next_pid += 1;
        inner.calls.push(ProcessCall::Spawn {
            pid,
            command: cmd.display(),
        });

        let stdout = OutputBuffer::with_capacity(cmd.output_capacity);
        let stderr = OutputBuffer::with_capacity(cmd.output_capacity);
        let (exit_tx, exit) = ExitWatch::channel();

        let ignore_terminate = match behavior {
            SpawnBehavior::Run {
                stdout: out,
                ignore_terminate,
            } => {
                stdout.append(out.as_bytes());
                ignore_terminate
            }
            SpawnBehavior::ExitImmediately {
                code,
                stdout: out,
                stderr: err,
            } => {
                stdout.append(out.as_bytes());
                stderr.append(err.as_bytes());
                exit_tx.exited(WorkerExit::code(code));
                false
            }
            SpawnBehavior::Fail(_) => false,
        };

        inner.processes.insert(
            pid,
            FakeProcess {
                pid,
                command: cmd.clone(),
                stdout: stdout.clone(),
                stderr: stderr.clone(),
                ignore_terminate,
                exit_tx,
            },
        );

        Ok(SpawnedWorker {
            pid,
            stdout,
            stderr,
            exit,
        })
    }

    async fn signal(&self, pid: u32, signal: Signal) -> Result<(), ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Signal { pid, signal });
        if let Some(message) = &inner.signal_failure {
            return Err(ProcessError::Signal {
                pid,
                signal,
                message: message.clone(),
            });
        }
        if let Some(process) = inner.processes.get(&pid) {
            if !process.is_alive() {
                return Ok(());
            }
            match signal {
                Signal::Terminate if process.ignore_terminate => {}
                Signal::Terminate => process.exit_tx.exited(WorkerExit::signal(SIGTERM)),
                Signal::Kill => process.exit_tx.exited(WorkerExit::signal(SIGKILL)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
