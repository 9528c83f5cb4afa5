// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors that carry a specific process exit code.

use std::fmt;

/// Command failed (worker did not start, daemon rejected the request)
pub const EXIT_FAILURE: i32 = 1;
/// No daemon is listening
pub const EXIT_DAEMON_NOT_RUNNING: i32 = 2;
/// The tenant store has no record for the requested tenant
pub const EXIT_UNKNOWN_TENANT: i32 = 3;

/// Returned from command handlers to set the exit code; `main` prints
/// the message (when non-empty) and exits with `code`.
#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Exit with `code` without printing anything more.
    pub fn silent(code: i32) -> Self {
        Self::new(code, String::new())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExitError {}
