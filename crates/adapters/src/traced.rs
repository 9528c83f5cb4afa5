// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::process::{ProcessAdapter, ProcessError, Signal, SpawnedWorker, WorkerCommand};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
///
/// Commands are logged through [`WorkerCommand::display`], so secret
/// arguments and environment values never reach the log.
#[derive(Clone)]
pub struct TracedProcess<P> {
    inner: P,
}

impl<P> TracedProcess<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcess<P> {
    async fn spawn(&self, cmd: &WorkerCommand) -> Result<SpawnedWorker, ProcessError> {
        let program = cmd.program.display().to_string();
        async {
            tracing::info!(command = %cmd.display(), env_count = cmd.env.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(cmd).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(w) => tracing::info!(pid = w.pid, elapsed_ms, "process spawned"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!("process.spawn", program = %program))
        .await
    }

    async fn signal(&self, pid: u32, signal: Signal) -> Result<(), ProcessError> {
        let result = self.inner.signal(pid, signal).await;
        tracing::info_span!("process.signal", pid, %signal).in_scope(|| match &result {
            Ok(()) => tracing::debug!("delivered"),
            Err(e) => tracing::warn!(error = %e, "signal failed"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
