// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle controller: start, stop, restart and bulk respawn of workers

use crate::error::{SpawnError, StopError, MAX_DIAGNOSTIC_CHARS};
use crate::handle::WorkerHandle;
use crate::launcher::{Launcher, LauncherConfig};
use crate::registry::ProcessRegistry;
use crate::report;
use bf_adapters::{head_chars, ProcessAdapter, Signal};
use bf_core::{Clock, LaunchRequest, StatusReport, TenantId, TenantRecord, WorkerExit};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub launcher: LauncherConfig,
    /// How long a worker gets to honor SIGTERM before SIGKILL.
    pub stop_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            launcher: LauncherConfig::default(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// External collaborators the supervisor drives.
pub struct SupervisorDeps<P> {
    pub process: P,
    pub registry: Arc<ProcessRegistry>,
}

/// How a stopped worker went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The worker had already exited; no signal was sent.
    AlreadyExited(WorkerExit),
    /// The worker exited after SIGTERM.
    Terminated(WorkerExit),
    /// The worker outlived the stop timeout and was killed.
    Killed(WorkerExit),
}

impl StopOutcome {
    pub fn exit(&self) -> WorkerExit {
        match self {
            StopOutcome::AlreadyExited(e) | StopOutcome::Terminated(e) | StopOutcome::Killed(e) => {
                *e
            }
        }
    }
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopOutcome::AlreadyExited(e) => write!(f, "already exited ({e})"),
            StopOutcome::Terminated(e) => write!(f, "terminated ({e})"),
            StopOutcome::Killed(e) => write!(f, "killed after timeout ({e})"),
        }
    }
}

/// Per-tenant worker supervisor.
///
/// Every start/stop/restart for a tenant runs under that tenant's lock, so
/// concurrent commands for one tenant never race to spawn two workers.
/// Different tenants never wait on each other.
pub struct Supervisor<P: ProcessAdapter, C: Clock> {
    process: P,
    registry: Arc<ProcessRegistry>,
    launcher: Launcher<P, C>,
    clock: C,
    stop_timeout: Duration,
}

impl<P: ProcessAdapter, C: Clock> Supervisor<P, C> {
    pub fn new(deps: SupervisorDeps<P>, clock: C, config: SupervisorConfig) -> Self {
        let launcher = Launcher::new(
            deps.process.clone(),
            clock.clone(),
            config.launcher,
            Arc::clone(&deps.registry),
        );
        Self {
            process: deps.process,
            registry: deps.registry,
            launcher,
            clock,
            stop_timeout: config.stop_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    pub fn launcher(&self) -> &Launcher<P, C> {
        &self.launcher
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Start the tenant's worker; true if a worker is running afterwards.
    pub async fn start(&self, tenant_id: &TenantId, request: &LaunchRequest) -> bool {
        self.try_start(tenant_id, request).await.is_ok()
    }

    /// Like [`start`](Self::start) but keeps the failure for the caller.
    pub async fn try_start(
        &self,
        tenant_id: &TenantId,
        request: &LaunchRequest,
    ) -> Result<Arc<WorkerHandle>, SpawnError> {
        let lock = self.registry.tenant_lock(tenant_id);
        let _guard = lock.lock().await;
        self.start_locked(tenant_id, request).await
    }

    /// Stop the tenant's worker; false if none was registered or the OS
    /// refused a signal.
    pub async fn stop(&self, tenant_id: &TenantId) -> bool {
        matches!(self.try_stop(tenant_id).await, Ok(Some(_)))
    }

    /// `Ok(None)` when no worker is registered for the tenant.
    pub async fn try_stop(&self, tenant_id: &TenantId) -> Result<Option<StopOutcome>, StopError> {
        let lock = self.registry.tenant_lock(tenant_id);
        let _guard = lock.lock().await;
        self.stop_locked(tenant_id).await
    }

    pub async fn restart(&self, tenant_id: &TenantId, request: &LaunchRequest) -> bool {
        self.try_restart(tenant_id, request).await.is_ok()
    }

    /// Stop (outcome ignored) then start, as one step under the tenant lock.
    pub async fn try_restart(
        &self,
        tenant_id: &TenantId,
        request: &LaunchRequest,
    ) -> Result<Arc<WorkerHandle>, SpawnError> {
        let lock = self.registry.tenant_lock(tenant_id);
        let _guard = lock.lock().await;
        // Failures are already logged; the start decides the result
        let _ = self.stop_locked(tenant_id).await;
        self.start_locked(tenant_id, request).await
    }

    pub fn is_running(&self, tenant_id: &TenantId) -> bool {
        self.registry
            .lookup(tenant_id)
            .is_some_and(|handle| handle.is_alive())
    }

    /// Start every active record, once per tenant. Returns how many of those
    /// tenants are running.
    pub async fn respawn_all(&self, records: &[TenantRecord], endpoint: Option<&str>) -> usize {
        let mut seen = HashSet::new();
        let active: Vec<&TenantRecord> = records
            .iter()
            .filter(|r| r.active && seen.insert(&r.tenant_id))
            .collect();
        let total = active.len();
        for record in &active {
            let request = record.launch_request(endpoint);
            self.start(&record.tenant_id, &request).await;
        }
        let running = active
            .iter()
            .filter(|r| self.is_running(&r.tenant_id))
            .count();
        tracing::info!(running, total, "respawned {running}/{total} workers");
        running
    }

    /// Stop every registered worker. Returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let mut stopped = 0;
        for tenant_id in self.registry.tenant_ids() {
            if self.stop(&tenant_id).await {
                stopped += 1;
            }
        }
        stopped
    }

    pub fn running_count(&self) -> usize {
        self.registry.count()
    }

    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    /// Non-blocking status snapshot for one tenant.
    pub fn describe(&self, tenant_id: &TenantId) -> StatusReport {
        report::describe(&self.registry, &self.clock, tenant_id)
    }

    pub fn list(&self) -> Vec<StatusReport> {
        self.registry
            .tenant_ids()
            .iter()
            .map(|tenant_id| self.describe(tenant_id))
            .collect()
    }

    /// Log each registered worker that died on its own, once per worker.
    ///
    /// Dead handles stay registered so `describe` can show their output
    /// until the next start or stop.
    pub fn reap(&self) -> Vec<(TenantId, WorkerExit)> {
        let mut crashed = Vec::new();
        for handle in self.registry.handles() {
            let Some(exit) = handle.probe() else {
                continue;
            };
            if handle.is_stopping() || !handle.claim_crash_report() {
                continue;
            }
            tracing::warn!(
                tenant_id = %handle.tenant_id(),
                pid = handle.pid(),
                %exit,
                stderr = %handle.redact(&handle.stderr().tail(MAX_DIAGNOSTIC_CHARS)),
                "worker exited unexpectedly"
            );
            crashed.push((handle.tenant_id().clone(), exit));
        }
        crashed
    }

    async fn start_locked(
        &self,
        tenant_id: &TenantId,
        request: &LaunchRequest,
    ) -> Result<Arc<WorkerHandle>, SpawnError> {
        let result = self.launcher.spawn(tenant_id, request).await;
        match &result {
            Ok(handle) => {
                tracing::info!(tenant_id = %tenant_id, pid = handle.pid(), "worker running")
            }
            Err(e) => tracing::error!(
                tenant_id = %tenant_id,
                error = %e,
                diagnostics = head_chars(e.diagnostics().unwrap_or(""), MAX_DIAGNOSTIC_CHARS),
                "failed to start worker"
            ),
        }
        result
    }

    async fn stop_locked(&self, tenant_id: &TenantId) -> Result<Option<StopOutcome>, StopError> {
        let Some(handle) = self.registry.lookup(tenant_id) else {
            tracing::debug!(tenant_id = %tenant_id, "no worker to stop");
            return Ok(None);
        };

        handle.begin_stop();
        let result = self.terminate(&handle).await;
        self.registry.remove_if(tenant_id, handle.pid());

        match &result {
            Ok(outcome) => {
                tracing::info!(tenant_id = %tenant_id, pid = handle.pid(), %outcome, "worker stopped")
            }
            Err(e) => {
                tracing::error!(tenant_id = %tenant_id, pid = handle.pid(), error = %e, "failed to stop worker")
            }
        }
        result.map(Some)
    }

    /// SIGTERM, wait up to the stop timeout, then SIGKILL and wait.
    async fn terminate(&self, handle: &WorkerHandle) -> Result<StopOutcome, StopError> {
        if let Some(exit) = handle.probe() {
            return Ok(StopOutcome::AlreadyExited(exit));
        }

        self.process.signal(handle.pid(), Signal::Terminate).await?;
        if let Some(exit) = handle.wait_timeout(self.stop_timeout).await {
            return Ok(StopOutcome::Terminated(exit));
        }

        tracing::warn!(
            tenant_id = %handle.tenant_id(),
            pid = handle.pid(),
            timeout_ms = self.stop_timeout.as_millis() as u64,
            "worker ignored SIGTERM, killing"
        );
        self.process.signal(handle.pid(), Signal::Kill).await?;
        Ok(StopOutcome::Killed(handle.wait().await))
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
