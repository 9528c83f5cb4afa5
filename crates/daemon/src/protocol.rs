// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use bf_core::{Secret, StatusReport, TenantId};
use serde::{Deserialize, Serialize};

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    decode, encode, read_message, read_request, recv, send, write_message, write_response,
    ProtocolError, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};

/// Request from CLI to daemon
///
/// Credentials travel as plain JSON over the owner-only socket; their
/// `Debug` form is masked so request logging never shows them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Start a tenant's worker. Missing credentials come from the tenant store.
    Start {
        tenant_id: TenantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bot_token: Option<Secret>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model_key: Option<Secret>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        collection: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Stop a tenant's worker
    Stop { tenant_id: TenantId },

    /// Stop then start, with the same credential resolution as `Start`
    Restart {
        tenant_id: TenantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bot_token: Option<Secret>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model_key: Option<Secret>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        collection: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Liveness of one tenant's worker
    IsRunning { tenant_id: TenantId },

    /// Status report for one tenant
    Describe { tenant_id: TenantId },

    /// Status reports for every registered tenant
    List,

    /// Start every active tenant from the store
    RespawnAll,

    /// Get daemon status
    Status,

    /// Stop all workers and exit
    Shutdown,
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Worker is running after start/restart
    Started { report: StatusReport },

    /// Worker could not be started
    StartFailed {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        diagnostics: Option<String>,
    },

    /// Result of a stop; false when nothing was registered
    Stopped { stopped: bool },

    Running { running: bool },

    Report { report: StatusReport },

    Reports { reports: Vec<StatusReport> },

    Respawned { running: usize, total: usize },

    /// Daemon status
    Status {
        uptime_secs: u64,
        workers_running: usize,
        workers_registered: usize,
    },

    /// No credentials supplied and the store has no such tenant
    UnknownTenant { tenant_id: TenantId },

    /// Daemon is shutting down
    ShuttingDown,

    /// Error response
    Error { message: String },
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
