// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod daemon;
pub mod tenant;

use crate::client::ClientError;
use crate::exit_error::{
    ExitError, EXIT_DAEMON_NOT_RUNNING, EXIT_FAILURE, EXIT_UNKNOWN_TENANT,
};

/// Attach the exit code that matches a client error.
pub fn client_exit(err: ClientError) -> anyhow::Error {
    let code = if err.is_not_running() {
        EXIT_DAEMON_NOT_RUNNING
    } else if matches!(err, ClientError::UnknownTenant(_)) {
        EXIT_UNKNOWN_TENANT
    } else {
        EXIT_FAILURE
    };
    let message = if err.is_not_running() {
        ClientError::DaemonNotRunning.to_string()
    } else {
        err.to_string()
    };
    ExitError::new(code, message).into()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
