// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locating, launching and reaping the `bfd` process.

use crate::client::{poll_interval, ClientError};
use bf_daemon::STARTUP_MARKER_PREFIX;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Files the daemon keeps in its state directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonPaths {
    pub dir: PathBuf,
    pub socket: PathBuf,
    pub pid: PathBuf,
    pub log: PathBuf,
}

impl DaemonPaths {
    /// Paths under the state directory resolved from the environment.
    pub fn resolve() -> Result<Self, ClientError> {
        Ok(Self::in_dir(crate::env::state_dir()?))
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            socket: dir.join("daemon.sock"),
            pid: dir.join("daemon.pid"),
            log: dir.join("daemon.log"),
            dir,
        }
    }

    /// PID recorded by the running (or crashed) daemon.
    pub fn read_pid(&self) -> Option<u32> {
        std::fs::read_to_string(&self.pid)
            .ok()
            .and_then(|content| content.trim().parse().ok())
    }

    pub fn clear_pid(&self) {
        let _ = std::fs::remove_file(&self.pid);
    }

    /// Error logged by the most recent startup attempt, if it failed.
    pub fn startup_error(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.log).ok()?;
        parse_startup_error(&content)
    }

    /// Remove a socket nobody accepts on. The PID file goes too unless it
    /// names a live process. Returns whether anything was removed.
    pub fn clear_stale_socket(&self) -> bool {
        if self.read_pid().is_some_and(process_exists) {
            return false;
        }
        let removed = std::fs::remove_file(&self.socket).is_ok();
        self.clear_pid();
        removed
    }
}

/// Launch `bfd` detached from this terminal.
pub fn start_daemon_background() -> Result<Child, ClientError> {
    let bfd = find_bfd_binary();
    Command::new(&bfd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {}", bfd.display(), e)))
}

/// `BF_DAEMON_BINARY`, then the dev build next to the workspace, then a
/// sibling of this executable, then `bfd` on `PATH`.
pub fn find_bfd_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    let exe = std::env::current_exe().ok();

    let dev_build = exe
        .as_deref()
        .and_then(Path::to_str)
        .is_some_and(|s| s.contains("target/debug"));
    if dev_build {
        let candidate = crate::env::cargo_manifest_dir()
            .map(PathBuf::from)
            .and_then(|manifest| manifest.ancestors().nth(2).map(Path::to_path_buf))
            .map(|root| root.join("target/debug/bfd"));
        if let Some(path) = candidate.filter(|p| p.exists()) {
            return path;
        }
    }

    exe.as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join("bfd"))
        .filter(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from("bfd"))
}

/// Poll until `pid` is gone; false if it outlived `timeout`.
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(poll_interval()).await;
    }
    !process_exists(pid)
}

fn kill(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

pub fn process_exists(pid: u32) -> bool {
    kill("-0", pid)
}

pub fn force_kill_daemon(pid: u32) -> bool {
    kill("-9", pid)
}

/// Error lines after the last startup marker, each stripped of its
/// level and context prefix.
fn parse_startup_error(content: &str) -> Option<String> {
    let attempt = &content[content.rfind(STARTUP_MARKER_PREFIX)?..];
    let errors: Vec<&str> = attempt
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .map(|line| line.split_once(": ").map_or(line, |(_, msg)| msg))
        .collect();
    (!errors.is_empty()).then(|| errors.join("\n"))
}

/// Replace `err` with the logged startup failure when there is one.
pub fn wrap_with_startup_error(err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }
    match DaemonPaths::resolve().ok().and_then(|p| p.startup_error()) {
        Some(logged) => ClientError::DaemonStartFailed(logged),
        None => err,
    }
}

/// Whether something accepts connections on `socket_path`.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
