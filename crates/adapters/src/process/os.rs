// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real OS process adapter built on `tokio::process`.
//!
//! Each spawned child gets two pump tasks (stdout, stderr) and one reaper
//! task that awaits `Child::wait()` and publishes the exit on the child's
//! [`ExitWatch`]. The supervisor therefore never blocks on a child: probing
//! liveness is a read of the watch channel.

use super::{ExitSender, ExitWatch, ProcessAdapter, ProcessError, Signal, SpawnedWorker, WorkerCommand};
use crate::output::OutputBuffer;
use async_trait::async_trait;
use bf_core::WorkerExit;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal as NixSignal};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// How long the reaper waits for pipes to drain after the child exits.
///
/// Grandchildren may hold the pipes open indefinitely; the exit is published
/// regardless once this elapses.
const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

const READ_CHUNK: usize = 4096;

/// Process adapter that starts real child processes.
#[derive(Clone, Default)]
pub struct OsProcessAdapter;

impl OsProcessAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessAdapter for OsProcessAdapter {
    async fn spawn(&self, cmd: &WorkerCommand) -> Result<SpawnedWorker, ProcessError> {
        let mut command = Command::new(&cmd.program);
        command
            .args(cmd.exposed_args())
            .envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.expose())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref cwd) = cmd.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: cmd.program.display().to_string(),
            source,
        })?;
        let pid = child
            .id()
            .ok_or_else(|| ProcessError::NoPid(cmd.program.display().to_string()))?;

        let stdout = OutputBuffer::with_capacity(cmd.output_capacity);
        let stderr = OutputBuffer::with_capacity(cmd.output_capacity);
        let pumps = [
            child.stdout.take().map(|r| spawn_pump(r, stdout.clone())),
            child.stderr.take().map(|r| spawn_pump(r, stderr.clone())),
        ];

        let (exit_tx, exit) = ExitWatch::channel();
        tokio::spawn(reap(pid, child, pumps, exit_tx));

        Ok(SpawnedWorker {
            pid,
            stdout,
            stderr,
            exit,
        })
    }

    async fn signal(&self, pid: u32, signal: Signal) -> Result<(), ProcessError> {
        let raw = i32::try_from(pid).map_err(|_| ProcessError::Signal {
            pid,
            signal,
            message: "pid out of range".to_string(),
        })?;
        let nix_signal = match signal {
            Signal::Terminate => NixSignal::SIGTERM,
            Signal::Kill => NixSignal::SIGKILL,
        };
        match kill(Pid::from_raw(raw), nix_signal) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(ProcessError::Signal {
                pid,
                signal,
                message: errno.desc().to_string(),
            }),
        }
    }
}

fn spawn_pump<R>(mut reader: R, buffer: OutputBuffer) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buffer.append(&chunk[..n]),
                Err(e) => {
                    tracing::debug!(error = %e, "output pipe read failed");
                    break;
                }
            }
        }
    })
}

async fn reap(pid: u32, mut child: Child, pumps: [Option<JoinHandle<()>>; 2], exit_tx: ExitSender) {
    let exit = match child.wait().await {
        Ok(status) => WorkerExit {
            code: status.code(),
            signal: status.signal(),
        },
        Err(e) => {
            tracing::warn!(pid, error = %e, "failed to wait on worker");
            WorkerExit::default()
        }
    };

    exit_tx.reaped(exit);

    let drain = async {
        for pump in pumps.into_iter().flatten() {
            let _ = pump.await;
        }
    };
    if tokio::time::timeout(PIPE_DRAIN_TIMEOUT, drain).await.is_err() {
        tracing::debug!(pid, "output pipes still open after exit");
    }

    tracing::debug!(pid, %exit, "worker output settled");
    exit_tx.exited(exit);
}

#[cfg(test)]
#[path = "os_tests.rs"]
mod tests;
