// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for worker start and stop

use bf_adapters::ProcessError;
use bf_core::WorkerExit;
use std::path::PathBuf;
use thiserror::Error;

/// Captured output attached to a failure is cut to this many characters.
pub const MAX_DIAGNOSTIC_CHARS: usize = 2000;

/// Errors that can occur while launching a worker
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("worker executable not found: {}", .0.display())]
    WorkerNotFound(PathBuf),
    #[error("worker exited during startup ({})", exit_status(.exit_code, .signal))]
    EarlyExit {
        exit_code: Option<i32>,
        signal: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error(transparent)]
    Os(#[from] ProcessError),
}

impl SpawnError {
    /// Stderr (or stdout when stderr is empty) of a worker that died at startup.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            SpawnError::EarlyExit { stdout, stderr, .. } if stderr.trim().is_empty() => {
                Some(stdout.as_str()).filter(|s| !s.trim().is_empty())
            }
            SpawnError::EarlyExit { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}

fn exit_status(code: &Option<i32>, signal: &Option<i32>) -> WorkerExit {
    WorkerExit {
        code: *code,
        signal: *signal,
    }
}

/// Errors that can occur while stopping a worker
#[derive(Debug, Error)]
pub enum StopError {
    #[error(transparent)]
    Os(#[from] ProcessError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
