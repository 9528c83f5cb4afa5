// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

// --- Duration helper (private) ---

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.trim().is_empty())
}

/// Resolve state directory: BF_STATE_DIR > XDG_STATE_HOME/bf > ~/.local/state/bf
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("BF_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("bf"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/bf"))
}

// --- Worker ---

pub fn worker_binary() -> Option<PathBuf> {
    non_empty("BF_WORKER_BINARY").map(PathBuf::from)
}

pub fn worker_entry() -> Option<PathBuf> {
    non_empty("BF_WORKER_ENTRY").map(PathBuf::from)
}

pub fn vector_url() -> Option<String> {
    non_empty("BF_VECTOR_URL")
}

// --- Timing ---

pub fn grace_ms() -> Option<Duration> {
    parse_duration_ms("BF_GRACE_MS")
}

pub fn stop_timeout_ms() -> Option<Duration> {
    parse_duration_ms("BF_STOP_TIMEOUT_MS")
}

pub fn health_check_ms() -> Option<Duration> {
    parse_duration_ms("BF_HEALTH_CHECK_MS")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
