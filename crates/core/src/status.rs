// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Derived worker status and the introspection report.

use crate::tenant::TenantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Liveness of a tenant's worker, computed on demand and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// No worker registered for the tenant.
    Absent,
    /// Spawned, still inside the grace interval.
    Starting,
    Running,
    /// Registered, but the process has exited.
    Terminated,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Absent => "absent",
            ProcessStatus::Starting => "starting",
            ProcessStatus::Running => "running",
            ProcessStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a worker process ended.
///
/// `code` is absent when the process was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerExit {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl WorkerExit {
    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {}", code),
            (None, Some(sig)) => write!(f, "killed by signal {}", sig),
            (None, None) => f.write_str("exited"),
        }
    }
}

/// Snapshot of one tenant's worker for status/debug output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub tenant_id: TenantId,
    pub status: ProcessStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_head: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_tail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_head: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_tail: Option<String>,
}

impl StatusReport {
    /// Report for a tenant with no registered worker.
    pub fn absent(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            status: ProcessStatus::Absent,
            pid: None,
            exit_code: None,
            signal: None,
            started_at_ms: None,
            uptime_ms: None,
            stdout_head: None,
            stdout_tail: None,
            stderr_head: None,
            stderr_tail: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ProcessStatus::Running
    }

    /// Short human-readable status line, e.g. `running (pid 123)`.
    pub fn summary(&self) -> String {
        match self.status {
            ProcessStatus::Running | ProcessStatus::Starting => match self.pid {
                Some(pid) => format!("{} (pid {})", self.status, pid),
                None => self.status.to_string(),
            },
            ProcessStatus::Terminated => {
                let exit = WorkerExit {
                    code: self.exit_code,
                    signal: self.signal,
                };
                format!("terminated ({})", exit)
            }
            ProcessStatus::Absent => "absent".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
