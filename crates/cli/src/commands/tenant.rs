// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tenant worker commands: start, stop, restart, running, describe,
//! list, respawn

use anyhow::Result;
use bf_core::{Secret, TenantId};
use clap::Args;

use super::client_exit;
use crate::client::{DaemonClient, LaunchFields, StartOutcome};
use crate::exit_error::{ExitError, EXIT_FAILURE};
use crate::output::{print_json, print_report, print_reports, OutputFormat};

/// Tenant ID argument
#[derive(Args, Debug, Clone)]
pub struct TenantArg {
    /// Tenant (end-user) ID
    pub tenant_id: String,
}

impl TenantArg {
    pub fn id(&self) -> TenantId {
        TenantId::new(self.tenant_id.trim())
    }
}

/// Arguments for `start` and `restart`.
///
/// Credentials left unset are read from the daemon's tenant store.
#[derive(Args, Debug, Clone)]
pub struct LaunchArgs {
    /// Tenant (end-user) ID
    pub tenant_id: String,

    /// Chat bot token
    #[arg(long, env = "BF_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Language-model API key
    #[arg(long, env = "BF_MODEL_KEY", hide_env_values = true)]
    pub model_key: Option<String>,

    /// Vector collection name (default: user_<tenant>)
    #[arg(long)]
    pub collection: Option<String>,

    /// Vector-service endpoint (default: daemon setting)
    #[arg(long)]
    pub endpoint: Option<String>,
}

impl LaunchArgs {
    pub fn id(&self) -> TenantId {
        TenantId::new(self.tenant_id.trim())
    }

    pub fn fields(&self) -> LaunchFields {
        LaunchFields {
            bot_token: self.bot_token.clone().filter(|s| !s.is_empty()).map(Secret::new),
            model_key: self.model_key.clone().filter(|s| !s.is_empty()).map(Secret::new),
            collection: self.collection.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

pub async fn start(client: &DaemonClient, args: LaunchArgs, format: OutputFormat) -> Result<()> {
    let tenant_id = args.id();
    let outcome = client
        .start_worker(&tenant_id, args.fields())
        .await
        .map_err(client_exit)?;
    report_start(&tenant_id, outcome, "Started", format)
}

pub async fn restart(client: &DaemonClient, args: LaunchArgs, format: OutputFormat) -> Result<()> {
    let tenant_id = args.id();
    let outcome = client
        .restart_worker(&tenant_id, args.fields())
        .await
        .map_err(client_exit)?;
    report_start(&tenant_id, outcome, "Restarted", format)
}

fn report_start(
    tenant_id: &TenantId,
    outcome: StartOutcome,
    verb: &str,
    format: OutputFormat,
) -> Result<()> {
    match outcome {
        StartOutcome::Started(report) => {
            match format {
                OutputFormat::Text => println!(
                    "{} worker for tenant {}: {}",
                    verb,
                    tenant_id,
                    report.summary()
                ),
                OutputFormat::Json => print_json(&report)?,
            }
            Ok(())
        }
        StartOutcome::Failed {
            message,
            diagnostics,
        } => {
            match format {
                OutputFormat::Text => {
                    if let Some(diagnostics) = &diagnostics {
                        eprintln!("{}", diagnostics.trim_end());
                    }
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "tenant_id": tenant_id,
                    "started": false,
                    "message": message,
                    "diagnostics": diagnostics,
                }))?,
            }
            Err(ExitError::new(
                EXIT_FAILURE,
                format!("tenant {}: {}", tenant_id, message),
            )
            .into())
        }
    }
}

pub async fn stop(client: &DaemonClient, args: TenantArg, format: OutputFormat) -> Result<()> {
    let tenant_id = args.id();
    let stopped = client.stop_worker(&tenant_id).await.map_err(client_exit)?;
    match format {
        OutputFormat::Text if stopped => println!("Stopped worker for tenant {}", tenant_id),
        OutputFormat::Text => println!("No worker registered for tenant {}", tenant_id),
        OutputFormat::Json => print_json(&serde_json::json!({
            "tenant_id": tenant_id,
            "stopped": stopped,
        }))?,
    }
    Ok(())
}

/// Exit 0 when the worker is alive, 1 otherwise.
pub async fn running(client: &DaemonClient, args: TenantArg, format: OutputFormat) -> Result<()> {
    let tenant_id = args.id();
    let running = client.is_running(&tenant_id).await.map_err(client_exit)?;
    match format {
        OutputFormat::Text if running => println!("running"),
        OutputFormat::Text => println!("not running"),
        OutputFormat::Json => print_json(&serde_json::json!({
            "tenant_id": tenant_id,
            "running": running,
        }))?,
    }
    if running {
        Ok(())
    } else {
        Err(ExitError::silent(EXIT_FAILURE).into())
    }
}

pub async fn describe(client: &DaemonClient, args: TenantArg, format: OutputFormat) -> Result<()> {
    let report = client.describe(&args.id()).await.map_err(client_exit)?;
    print_report(&report, format)
}

pub async fn list(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let reports = client.list().await.map_err(client_exit)?;
    print_reports(&reports, format)
}

pub async fn respawn(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let (running, total) = client.respawn_all().await.map_err(client_exit)?;
    match format {
        OutputFormat::Text => println!("Respawned {}/{} workers", running, total),
        OutputFormat::Json => print_json(&serde_json::json!({
            "running": running,
            "total": total,
        }))?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "tenant_tests.rs"]
mod tests;
