// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bf-supervisor: per-tenant worker registry, launcher and lifecycle control

mod error;
mod handle;
mod health;
mod launcher;
mod registry;
mod report;
mod supervisor;

#[cfg(test)]
mod test_helpers;

pub use error::{SpawnError, StopError, MAX_DIAGNOSTIC_CHARS};
pub use handle::WorkerHandle;
pub use health::spawn_health_check;
pub use launcher::{
    CredentialChannel, Launcher, LauncherConfig, BOT_TOKEN_ENV, DEFAULT_GRACE, MODEL_KEY_ENV,
};
pub use registry::ProcessRegistry;
pub use report::{render, EXCERPT_CHARS};
pub use supervisor::{
    StopOutcome, Supervisor, SupervisorConfig, SupervisorDeps, DEFAULT_STOP_TIMEOUT,
};
