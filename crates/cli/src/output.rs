// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bf_core::StatusReport;
use clap::ValueEnum;
use serde::Serialize;

use crate::table::{Column, Table};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format whole seconds as "5s", "2m5s", "1h2m" or "3d4h".
pub fn format_uptime(secs: u64) -> String {
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m{}s", s / 60, s % 60),
        s if s < 86_400 => format!("{}h{}m", s / 3600, (s % 3600) / 60),
        s => format!("{}d{}h", s / 86_400, (s % 86_400) / 3600),
    }
}

/// One table row per tenant.
pub fn render_report_table(reports: &[StatusReport]) -> String {
    let mut table = Table::new(vec![
        Column::left("TENANT").with_max(24),
        Column::left("STATUS"),
        Column::right("PID"),
        Column::right("UPTIME"),
        Column::left("EXIT"),
    ]);
    for report in reports {
        let exit = match (report.exit_code, report.signal) {
            (Some(code), _) => format!("code {code}"),
            (None, Some(signal)) => format!("signal {signal}"),
            (None, None) => "-".to_string(),
        };
        table.row(vec![
            report.tenant_id.to_string(),
            report.status.to_string(),
            report.pid.map_or_else(|| "-".to_string(), |p| p.to_string()),
            report
                .uptime_ms
                .map_or_else(|| "-".to_string(), |ms| format_uptime(ms / 1000)),
            exit,
        ]);
    }
    let mut buf = Vec::new();
    table.render(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Print reports as a table or a JSON array.
pub fn print_reports(reports: &[StatusReport], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text if reports.is_empty() => println!("No workers registered"),
        OutputFormat::Text => print!("{}", render_report_table(reports)),
        OutputFormat::Json => print_json(reports)?,
    }
    Ok(())
}

/// Print one report as the multi-line diagnostic or JSON.
pub fn print_report(report: &StatusReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", bf_supervisor::render(report)),
        OutputFormat::Json => print_json(report)?,
    }
    Ok(())
}
