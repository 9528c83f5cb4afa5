// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registered worker handle

use bf_adapters::{ExitWatch, OutputBuffer, SpawnedWorker};
use bf_core::{ProcessStatus, Redactor, TenantId, WorkerExit};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A spawned worker owned by the registry.
///
/// Probing is non-blocking: the exit status is published by the adapter's
/// reaper task, never polled from the OS here.
#[derive(Debug)]
pub struct WorkerHandle {
    tenant_id: TenantId,
    pid: u32,
    command_line: String,
    started_at_ms: u64,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
    redactor: Redactor,
    exit: ExitWatch,
    stopping: AtomicBool,
    crash_reported: AtomicBool,
}

impl WorkerHandle {
    /// `command_line` must already be redacted.
    pub fn new(
        tenant_id: TenantId,
        worker: SpawnedWorker,
        command_line: String,
        started_at_ms: u64,
    ) -> Self {
        Self {
            tenant_id,
            pid: worker.pid,
            command_line,
            started_at_ms,
            stdout: worker.stdout,
            stderr: worker.stderr,
            redactor: Redactor::default(),
            exit: worker.exit,
            stopping: AtomicBool::new(false),
            crash_reported: AtomicBool::new(false),
        }
    }

    /// Credentials to mask in everything read back from the worker's output.
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// `text` with the worker's credentials masked.
    pub fn redact(&self, text: &str) -> String {
        self.redactor.redact(text)
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    /// Raw captured output; use [`redact`](Self::redact) before it leaves
    /// the supervisor.
    pub fn stdout(&self) -> &OutputBuffer {
        &self.stdout
    }

    pub fn stderr(&self) -> &OutputBuffer {
        &self.stderr
    }

    /// Exit status, or `None` while the worker runs.
    pub fn probe(&self) -> Option<WorkerExit> {
        self.exit.probe()
    }

    pub fn is_alive(&self) -> bool {
        self.exit.is_alive()
    }

    pub fn status(&self) -> ProcessStatus {
        if self.is_alive() {
            ProcessStatus::Running
        } else {
            ProcessStatus::Terminated
        }
    }

    pub async fn wait(&self) -> WorkerExit {
        self.exit.wait().await
    }

    pub async fn wait_timeout(&self, timeout: Duration) -> Option<WorkerExit> {
        self.exit.wait_timeout(timeout).await
    }

    /// Resolves once the worker has exited and its output pipes are drained.
    pub async fn settled(&self) {
        self.exit.settled().await
    }

    /// Mark the worker as deliberately stopped so its exit is not a crash.
    pub(crate) fn begin_stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// True exactly once per handle, for the first caller that reports its crash.
    pub(crate) fn claim_crash_report(&self) -> bool {
        !self.crash_reported.swap(true, Ordering::SeqCst)
    }
}
