// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker launcher: command construction, spawn, and startup grace probe

use crate::error::{SpawnError, MAX_DIAGNOSTIC_CHARS};
use crate::handle::WorkerHandle;
use crate::registry::ProcessRegistry;
use bf_adapters::{OutputBuffer, ProcessAdapter, Signal, WorkerCommand, DEFAULT_OUTPUT_CAPACITY};
use bf_core::{Clock, LaunchRequest, Redactor, TenantId, DEFAULT_VECTOR_ENDPOINT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Child environment variable carrying the bot credential.
pub const BOT_TOKEN_ENV: &str = "BF_BOT_TOKEN";
/// Child environment variable carrying the model credential.
pub const MODEL_KEY_ENV: &str = "BF_MODEL_KEY";

pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);

/// How credentials reach the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialChannel {
    /// `BF_BOT_TOKEN` / `BF_MODEL_KEY` in the child's environment only.
    #[default]
    Env,
    /// `--bot-token` / `--openai-key` argv flags, visible in process listings.
    Args,
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub program: PathBuf,
    /// Script passed as the first argument, e.g. `main.py`.
    pub entry_point: Option<PathBuf>,
    pub extra_args: Vec<String>,
    pub credential_channel: CredentialChannel,
    pub default_endpoint: String,
    pub grace: Duration,
    pub output_capacity: usize,
    pub cwd: Option<PathBuf>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python3"),
            entry_point: None,
            extra_args: Vec::new(),
            credential_channel: CredentialChannel::Env,
            default_endpoint: DEFAULT_VECTOR_ENDPOINT.to_string(),
            grace: DEFAULT_GRACE,
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
            cwd: None,
        }
    }
}

pub struct Launcher<P: ProcessAdapter, C: Clock> {
    adapter: P,
    clock: C,
    config: LauncherConfig,
    registry: Arc<ProcessRegistry>,
}

impl<P: ProcessAdapter, C: Clock> Launcher<P, C> {
    pub fn new(adapter: P, clock: C, config: LauncherConfig, registry: Arc<ProcessRegistry>) -> Self {
        Self {
            adapter,
            clock,
            config,
            registry,
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Build the worker invocation for `tenant_id`.
    ///
    /// Fails with [`SpawnError::WorkerNotFound`] when the program or entry
    /// point cannot be found.
    pub fn build_command(
        &self,
        tenant_id: &TenantId,
        request: &LaunchRequest,
    ) -> Result<WorkerCommand, SpawnError> {
        let program = resolve_executable(&self.config.program)
            .ok_or_else(|| SpawnError::WorkerNotFound(self.config.program.clone()))?;

        let mut cmd = WorkerCommand::new(program);
        cmd.cwd = self.config.cwd.clone();
        cmd.output_capacity = self.config.output_capacity;

        if let Some(entry) = &self.config.entry_point {
            let located = match &self.config.cwd {
                Some(cwd) if entry.is_relative() => cwd.join(entry),
                _ => entry.clone(),
            };
            if !located.is_file() {
                return Err(SpawnError::WorkerNotFound(located));
            }
            cmd = cmd.arg(entry.display().to_string());
        }
        for arg in &self.config.extra_args {
            cmd = cmd.arg(arg.as_str());
        }

        cmd = cmd.arg("--user-id").arg(tenant_id.as_str());
        cmd = match self.config.credential_channel {
            CredentialChannel::Env => cmd
                .env(BOT_TOKEN_ENV, request.bot_token.clone())
                .env(MODEL_KEY_ENV, request.model_key.clone()),
            CredentialChannel::Args => cmd
                .arg("--bot-token")
                .secret_arg(request.bot_token.clone())
                .arg("--openai-key")
                .secret_arg(request.model_key.clone()),
        };
        Ok(cmd
            .arg("--collection")
            .arg(request.collection.as_str())
            .arg("--qdrant-url")
            .arg(request.endpoint_or(&self.config.default_endpoint)))
    }

    /// Start the tenant's worker unless a live one is already registered.
    ///
    /// The caller holds the tenant lock. A worker that exits within the grace
    /// interval is reported as [`SpawnError::EarlyExit`] and never registered.
    pub async fn spawn(
        &self,
        tenant_id: &TenantId,
        request: &LaunchRequest,
    ) -> Result<Arc<WorkerHandle>, SpawnError> {
        if let Some(existing) = self.registry.lookup(tenant_id) {
            if existing.is_alive() {
                tracing::info!(tenant_id = %tenant_id, pid = existing.pid(), "worker already running");
                return Ok(existing);
            }
        }

        let cmd = self.build_command(tenant_id, request)?;
        self.registry.mark_starting(tenant_id);
        let mut guard = StartGuard {
            registry: &self.registry,
            adapter: &self.adapter,
            tenant_id,
            orphan: None,
        };

        let worker = self.adapter.spawn(&cmd).await?;
        guard.orphan = Some(worker.pid);
        let redactor = Redactor::new([request.bot_token.clone(), request.model_key.clone()]);
        let handle = Arc::new(
            WorkerHandle::new(tenant_id.clone(), worker, cmd.display(), self.clock.epoch_ms())
                .with_redactor(redactor),
        );

        let early = handle.wait_timeout(self.config.grace).await;
        guard.orphan = None;
        if let Some(exit) = early {
            handle.settled().await;
            let excerpt = |buffer: &OutputBuffer| handle.redact(&buffer.tail(MAX_DIAGNOSTIC_CHARS));
            return Err(SpawnError::EarlyExit {
                exit_code: exit.code,
                signal: exit.signal,
                stdout: excerpt(handle.stdout()),
                stderr: excerpt(handle.stderr()),
            });
        }

        self.registry.register(Arc::clone(&handle));
        Ok(handle)
    }
}

/// Clears the tenant's starting mark however `spawn` ends. A worker whose
/// start was abandoned mid-grace (the future dropped) is killed.
struct StartGuard<'a, P: ProcessAdapter> {
    registry: &'a ProcessRegistry,
    adapter: &'a P,
    tenant_id: &'a TenantId,
    orphan: Option<u32>,
}

impl<P: ProcessAdapter> Drop for StartGuard<'_, P> {
    fn drop(&mut self) {
        self.registry.clear_starting(self.tenant_id);
        let Some(pid) = self.orphan.take() else {
            return;
        };
        tracing::warn!(tenant_id = %self.tenant_id, pid, "start abandoned, killing worker");
        let adapter = self.adapter.clone();
        let tenant_id = self.tenant_id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = adapter.signal(pid, Signal::Kill).await {
                        tracing::warn!(tenant_id = %tenant_id, pid, error = %e, "failed to kill abandoned worker");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(tenant_id = %tenant_id, pid, "no runtime to kill abandoned worker");
            }
        }
    }
}

/// Locate `program`: paths with a directory part must exist, bare names are
/// searched in `PATH`.
fn resolve_executable(program: &Path) -> Option<PathBuf> {
    if program.as_os_str().is_empty() {
        return None;
    }
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
