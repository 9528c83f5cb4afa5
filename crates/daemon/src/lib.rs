// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bot Factory daemon library
//!
//! Exposes the IPC protocol for CLI clients, plus the lifecycle and
//! listener pieces the `bfd` binary is assembled from.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod protocol;
pub mod tenants;

#[cfg(test)]
mod test_helpers;

pub use protocol::{Request, Response, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION};

/// Startup marker prefix written to log before anything else.
/// The CLI uses this to find where the current startup attempt begins.
/// Full format: "--- bfd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- bfd: starting (pid: ";
