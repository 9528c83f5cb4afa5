// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, respawn, shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use bf_adapters::{OsProcessAdapter, ProcessAdapter, TracedProcess};
use bf_core::{Clock, StoreError, SystemClock, TenantStore};
use bf_supervisor::{ProcessRegistry, Supervisor, SupervisorDeps};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::config::{ConfigError, Settings};
use crate::env::state_dir;
use crate::tenants::FileTenantStore;

/// Supervisor with concrete adapter types (wrapped with tracing)
pub type DaemonSupervisor = Supervisor<TracedProcess<OsProcessAdapter>, SystemClock>;

/// Daemon paths
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/bf)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to optional settings file
    pub config_path: PathBuf,
}

impl Config {
    /// Paths for the user-level daemon under `~/.local/state/bf/`
    /// (or `$XDG_STATE_HOME/bf/`, or `$BF_STATE_DIR`).
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::for_state_dir(state_dir()?))
    }

    pub fn for_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            config_path: state_dir.join("config.toml"),
            state_dir,
        }
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    pub settings: Settings,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub supervisor: Arc<DaemonSupervisor>,
    pub store: Arc<dyn TenantStore>,
    pub start_time: Instant,
}

/// Result of daemon startup: the daemon state plus the bound socket,
/// which is spawned separately as a Listener task.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

impl DaemonState {
    /// Stop every worker, then remove the socket and PID files.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        let stopped = self.supervisor.stop_all().await;
        if stopped > 0 {
            info!(stopped, "stopped workers");
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {}: {}", .0.display(), .1)]
    BindFailed(PathBuf, std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Another daemon owns the lock and its files
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST; opening without truncation keeps a
    //    running daemon's PID intact.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Settings (file, then environment)
    let settings = Settings::load(&config.config_path)?.with_env_overrides();
    let supervisor_config = settings.supervisor_config();
    info!(
        program = %supervisor_config.launcher.program.display(),
        channel = ?supervisor_config.launcher.credential_channel,
        "loaded settings"
    );

    // 4. Supervisor and tenant store
    let supervisor = Arc::new(Supervisor::new(
        SupervisorDeps {
            process: TracedProcess::new(OsProcessAdapter::new()),
            registry: Arc::new(ProcessRegistry::new()),
        },
        SystemClock,
        supervisor_config,
    ));
    let tenants_path = settings.tenants_path(&config.state_dir);
    info!("tenant records at {}", tenants_path.display());
    let store: Arc<dyn TenantStore> = Arc::new(FileTenantStore::new(tenants_path));

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            settings,
            lock_file,
            supervisor,
            store,
            start_time: Instant::now(),
        },
        listener,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    remove_if_exists(&config.socket_path);
    remove_if_exists(&config.lock_path);
}

fn remove_if_exists(path: &Path) {
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
}

/// Start a worker for every active tenant in `store`.
///
/// Returns `(running, total)`: workers alive afterwards and active
/// records considered. Individual spawn failures are logged and skipped.
pub async fn respawn_tenants<P, C>(
    supervisor: &Supervisor<P, C>,
    store: &dyn TenantStore,
) -> Result<(usize, usize), StoreError>
where
    P: ProcessAdapter,
    C: Clock,
{
    let records = store.active_tenants().await?;
    let running = supervisor.respawn_all(&records, None).await;
    Ok((running, records.len()))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
