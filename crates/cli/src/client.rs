// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::daemon_process::{
    probe_socket, start_daemon_background, wrap_with_startup_error, DaemonPaths,
};

use bf_core::{Secret, StatusReport, TenantId};
use bf_daemon::protocol::{self, ProtocolError};
use bf_daemon::{Request, Response, PROTOCOL_VERSION};
use thiserror::Error;
use tokio::net::UnixStream;

/// Timeout for quick IPC requests (hello, status, describe, shutdown)
pub fn timeout_ipc() -> Duration {
    crate::env::timeout_ipc_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for requests that start or stop workers
pub fn timeout_action() -> Duration {
    crate::env::timeout_action_ms().unwrap_or(Duration::from_secs(60))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    crate::env::timeout_connect_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    crate::env::timeout_exit_ms().unwrap_or(Duration::from_secs(10))
}

/// Polling interval for connection retries
pub fn poll_interval() -> Duration {
    crate::env::connect_poll_ms().unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running (start it with `bf daemon start`)")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Unknown tenant: {0}")]
    UnknownTenant(TenantId),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

impl ClientError {
    /// True when nothing is listening on the socket.
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::DaemonNotRunning => true,
            ClientError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

/// Launch fields sent with start/restart; anything left `None` is
/// filled in by the daemon from its tenant store.
#[derive(Debug, Clone, Default)]
pub struct LaunchFields {
    pub bot_token: Option<Secret>,
    pub model_key: Option<Secret>,
    pub collection: Option<String>,
    pub endpoint: Option<String>,
}

/// Outcome of a start or restart.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started(StatusReport),
    Failed {
        message: String,
        diagnostics: Option<String>,
    },
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to existing daemon (no auto-start)
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = DaemonPaths::resolve()?.socket;

        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }

        Ok(Self::at(socket_path))
    }

    /// Client for an explicit socket path
    pub fn at(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Connect to daemon, starting it in the background if needed
    pub fn connect_or_start() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                // The daemon may have crashed and left its socket behind
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    DaemonPaths::resolve()?.clear_stale_socket();
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let paths = DaemonPaths::resolve()?;
        let start = Instant::now();
        while start.elapsed() < timeout {
            // Early exit means startup failed; its reason is in the log
            if let Ok(Some(status)) = child.try_wait() {
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = paths.startup_error() {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    std::thread::sleep(poll_interval());
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {}",
                    status
                )));
            }

            match Self::connect() {
                Ok(client) if probe_socket(&client.socket_path) => return Ok(client),
                Ok(_) | Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(wrap_with_startup_error(e)),
            }
        }

        Err(wrap_with_startup_error(ClientError::DaemonStartTimeout))
    }

    /// One request per connection; `timeout` bounds the wait for the reply.
    async fn send_with_timeout(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::send(&mut writer, request, timeout_ipc()).await?;
        Ok(protocol::recv(&mut reader, timeout).await?)
    }

    /// Send a quick request
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc()).await
    }

    /// Daemon version via the `Hello` handshake.
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: PROTOCOL_VERSION.to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    /// Daemon status: (uptime_secs, workers_running, workers_registered)
    pub async fn status(&self) -> Result<(u64, usize, usize), ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status {
                uptime_secs,
                workers_running,
                workers_registered,
            } => Ok((uptime_secs, workers_running, workers_registered)),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown; the daemon stops every worker first
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn start_worker(
        &self,
        tenant_id: &TenantId,
        fields: LaunchFields,
    ) -> Result<StartOutcome, ClientError> {
        let request = Request::Start {
            tenant_id: tenant_id.clone(),
            bot_token: fields.bot_token,
            model_key: fields.model_key,
            collection: fields.collection,
            endpoint: fields.endpoint,
        };
        start_outcome(self.send_with_timeout(&request, timeout_action()).await?)
    }

    pub async fn restart_worker(
        &self,
        tenant_id: &TenantId,
        fields: LaunchFields,
    ) -> Result<StartOutcome, ClientError> {
        let request = Request::Restart {
            tenant_id: tenant_id.clone(),
            bot_token: fields.bot_token,
            model_key: fields.model_key,
            collection: fields.collection,
            endpoint: fields.endpoint,
        };
        start_outcome(self.send_with_timeout(&request, timeout_action()).await?)
    }

    /// Stop a worker; false when none was registered
    pub async fn stop_worker(&self, tenant_id: &TenantId) -> Result<bool, ClientError> {
        let request = Request::Stop {
            tenant_id: tenant_id.clone(),
        };
        match self.send_with_timeout(&request, timeout_action()).await? {
            Response::Stopped { stopped } => Ok(stopped),
            other => Err(unexpected(other)),
        }
    }

    pub async fn is_running(&self, tenant_id: &TenantId) -> Result<bool, ClientError> {
        let request = Request::IsRunning {
            tenant_id: tenant_id.clone(),
        };
        match self.send(&request).await? {
            Response::Running { running } => Ok(running),
            other => Err(unexpected(other)),
        }
    }

    pub async fn describe(&self, tenant_id: &TenantId) -> Result<StatusReport, ClientError> {
        let request = Request::Describe {
            tenant_id: tenant_id.clone(),
        };
        match self.send(&request).await? {
            Response::Report { report } => Ok(report),
            other => Err(unexpected(other)),
        }
    }

    pub async fn list(&self) -> Result<Vec<StatusReport>, ClientError> {
        match self.send(&Request::List).await? {
            Response::Reports { reports } => Ok(reports),
            other => Err(unexpected(other)),
        }
    }

    /// Start every active tenant: (running, total)
    pub async fn respawn_all(&self) -> Result<(usize, usize), ClientError> {
        match self
            .send_with_timeout(&Request::RespawnAll, timeout_action())
            .await?
        {
            Response::Respawned { running, total } => Ok((running, total)),
            other => Err(unexpected(other)),
        }
    }
}

fn start_outcome(response: Response) -> Result<StartOutcome, ClientError> {
    match response {
        Response::Started { report } => Ok(StartOutcome::Started(report)),
        Response::StartFailed {
            message,
            diagnostics,
        } => Ok(StartOutcome::Failed {
            message,
            diagnostics,
        }),
        other => Err(unexpected(other)),
    }
}

/// Map error-ish responses onto client errors.
fn unexpected(response: Response) -> ClientError {
    match response {
        Response::UnknownTenant { tenant_id } => ClientError::UnknownTenant(tenant_id),
        Response::Error { message } => ClientError::Rejected(message),
        _ => ClientError::UnexpectedResponse,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
