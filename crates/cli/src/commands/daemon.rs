// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bf daemon` - Daemon management commands

use crate::client::{timeout_exit, ClientError, DaemonClient};
use crate::daemon_process::{
    find_bfd_binary, force_kill_daemon, process_exists, wait_for_exit, DaemonPaths,
};
use crate::output::{format_uptime, print_json, OutputFormat};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use std::process::Command;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (background unless --foreground)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon and every worker it supervises
    Stop,
    /// Check daemon status
    Status,
    /// View recent daemon log lines
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Start { foreground } => start(foreground).await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status(format).await,
        DaemonCommand::Logs { limit } => logs(limit, format),
    }
}

async fn start(foreground: bool) -> Result<()> {
    if foreground {
        let status = Command::new(find_bfd_binary()).status()?;
        if !status.success() {
            return Err(anyhow!("Daemon exited with status: {}", status));
        }
        return Ok(());
    }

    if let Ok(client) = DaemonClient::connect() {
        if let Ok((uptime, _, _)) = client.status().await {
            println!("Daemon already running (uptime: {})", format_uptime(uptime));
            return Ok(());
        }
    }

    match DaemonClient::connect_or_start() {
        Ok(_client) => {
            println!("Daemon started");
            Ok(())
        }
        Err(e) => Err(anyhow!("{}", e)),
    }
}

/// Stop the daemon (graceful first, then forceful).
/// Returns true if the daemon was stopped, false if it wasn't running.
pub async fn daemon_stop() -> Result<bool, ClientError> {
    let paths = DaemonPaths::resolve()?;
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            paths.clear_pid();
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let shutdown_result = client.shutdown().await;

    if let Some(pid) = paths.read_pid() {
        if shutdown_result.is_ok() {
            // Workers are stopped before the daemon exits
            wait_for_exit(pid, timeout_exit()).await;
        }

        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    } else if let Err(e) = shutdown_result {
        if e.is_not_running() {
            return Ok(false);
        }
        return Err(e);
    }

    paths.clear_pid();
    Ok(true)
}

async fn stop() -> Result<()> {
    match daemon_stop().await {
        Ok(true) => {
            println!("Daemon stopped");
            Ok(())
        }
        Ok(false) => {
            println!("Daemon not running");
            Ok(())
        }
        Err(e) => Err(anyhow!("Failed to stop daemon: {}", e)),
    }
}

async fn status(format: OutputFormat) -> Result<()> {
    let not_running = || match format {
        OutputFormat::Text => {
            println!("Daemon not running");
            Ok(())
        }
        OutputFormat::Json => {
            println!(r#"{{ "status": "not_running" }}"#);
            Ok(())
        }
    };

    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => return not_running(),
    };

    let (uptime, running, registered) = match client.status().await {
        Ok(result) => result,
        Err(e) if e.is_not_running() => return not_running(),
        Err(e) => return Err(anyhow!("{}", e)),
    };
    let version = client
        .hello()
        .await
        .unwrap_or_else(|_| "unknown".to_string());

    match format {
        OutputFormat::Text => {
            println!("Status: running");
            println!("Version: {}", version);
            println!("Uptime: {}", format_uptime(uptime));
            println!("Workers: {} running, {} registered", running, registered);
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "status": "running",
            "version": version,
            "uptime_secs": uptime,
            "uptime": format_uptime(uptime),
            "workers_running": running,
            "workers_registered": registered,
        }))?,
    }

    Ok(())
}

fn logs(limit: usize, format: OutputFormat) -> Result<()> {
    let log_path = DaemonPaths::resolve()?.log;
    let content = std::fs::read_to_string(&log_path).unwrap_or_default();
    let lines = last_lines(&content, limit);

    match format {
        OutputFormat::Text => {
            if lines.is_empty() {
                eprintln!("No log entries found at {}", log_path.display());
            }
            for line in lines {
                println!("{}", line);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "log_path": log_path.to_string_lossy(),
            "lines": lines,
        }))?,
    }
    Ok(())
}

/// The last `limit` lines of `content`.
fn last_lines(content: &str, limit: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    let skip = lines.len().saturating_sub(limit);
    lines[skip..].to_vec()
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
