// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bf - Bot Factory CLI
//!
//! Talks to the `bfd` daemon, which owns one worker process per tenant.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;
mod env;
mod exit_error;
mod output;
mod table;

use output::OutputFormat;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{client_exit, daemon, tenant};

use crate::client::DaemonClient;

#[derive(Parser)]
#[command(name = "bf", version, about = "Bot Factory - per-tenant bot worker supervisor")]
pub(crate) struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start a tenant's worker (no-op when already running)
    Start(tenant::LaunchArgs),
    /// Stop a tenant's worker
    Stop(tenant::TenantArg),
    /// Stop then start a tenant's worker
    Restart(tenant::LaunchArgs),
    /// Exit 0 if a tenant's worker is alive, 1 otherwise
    Running(tenant::TenantArg),
    /// Show status and recent output for a tenant's worker
    Describe(tenant::TenantArg),
    /// List every registered worker
    List,
    /// Start workers for every active tenant in the store
    Respawn,
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

pub(crate) fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// The "Caused by" chain is skipped when every cause already appears in
/// the top-level message.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        // No subcommand: print help and exit 0
        cli_command().print_help()?;
        println!();
        return Ok(());
    };

    // Daemon commands manage the connection themselves
    let command = match command {
        Commands::Daemon(args) => return daemon::daemon(args, format).await,
        other => other,
    };

    // Tenant commands never start the daemon
    let client = DaemonClient::connect().map_err(client_exit)?;

    match command {
        Commands::Start(args) => tenant::start(&client, args, format).await,
        Commands::Stop(args) => tenant::stop(&client, args, format).await,
        Commands::Restart(args) => tenant::restart(&client, args, format).await,
        Commands::Running(args) => tenant::running(&client, args, format).await,
        Commands::Describe(args) => tenant::describe(&client, args, format).await,
        Commands::List => tenant::list(&client, format).await,
        Commands::Respawn => tenant::respawn(&client, format).await,
        Commands::Daemon(_) => Ok(()),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
