// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bot Factory Daemon (bfd)
//!
//! Background process that owns every tenant's worker.
//!
//! Architecture:
//! - Listener Task: accepts socket connections, one task per client
//! - Health Check Task: logs workers that died on their own
//! - Main Task: waits for a shutdown request or signal, then stops workers

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use bf_daemon::lifecycle::{self, Config, LifecycleError, StartupResult};
use bf_daemon::listener::{ListenCtx, Listener};
use bf_daemon::STARTUP_MARKER_PREFIX;
use bf_supervisor::spawn_health_check;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("bfd {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("bfd {VERSION}");
                println!("Bot Factory Daemon - supervises one bot worker process per tenant");
                println!();
                println!("USAGE:");
                println!("    bfd");
                println!();
                println!("The daemon is typically started by `bf daemon start` and should not");
                println!("be invoked directly. It listens on a Unix socket for commands");
                println!("from `bf`.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: bfd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Write startup marker to log (before tracing setup, so CLI can find it)
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("Starting daemon");

    let StartupResult {
        mut daemon,
        listener: unix_listener,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("bfd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let shutdown_notify = Arc::new(Notify::new());

    let listener = Listener::new(
        unix_listener,
        ListenCtx {
            supervisor: Arc::clone(&daemon.supervisor),
            store: Arc::clone(&daemon.store),
            start_time: daemon.start_time,
            shutdown: Arc::clone(&shutdown_notify),
        },
    );
    tokio::spawn(listener.run());

    let health = spawn_health_check(
        Arc::clone(&daemon.supervisor),
        daemon.settings.health_check_interval(),
    );

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "Daemon ready, listening on {}",
        config.socket_path.display()
    );

    // Signal ready for parent process (e.g., systemd, CLI waiting for startup)
    println!("READY");

    // Respawn in the background; the daemon is already accepting connections
    {
        let supervisor = Arc::clone(&daemon.supervisor);
        let store = Arc::clone(&daemon.store);
        tokio::spawn(async move {
            match lifecycle::respawn_tenants(&*supervisor, store.as_ref()).await {
                Ok((running, total)) => {
                    info!(running, total, "background respawn complete")
                }
                Err(e) => warn!("background respawn skipped: {}", e),
            }
        });
    }

    tokio::select! {
        _ = shutdown_notify.notified() => {
            info!("Shutdown requested via command");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
        }
    }

    health.abort();
    daemon.shutdown().await?;
    info!("Daemon stopped");
    Ok(())
}

/// Append one line to the daemon log outside of tracing, which is either
/// not installed yet or may not flush before exit.
fn append_log_line(config: &Config, line: &str) -> std::io::Result<()> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{line}")
}

fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    let marker = format!("{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id());
    Ok(append_log_line(config, &marker)?)
}

/// The CLI reports this line when `bf daemon start` fails.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    let _ = append_log_line(config, &format!("ERROR Failed to start daemon: {error}"));
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
