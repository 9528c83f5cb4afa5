// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status reports and their text rendering

use crate::handle::WorkerHandle;
use crate::registry::ProcessRegistry;
use bf_adapters::OutputBuffer;
use bf_core::{Clock, ProcessStatus, StatusReport, TenantId};
use std::fmt::Write;

/// Characters kept in each output excerpt.
pub const EXCERPT_CHARS: usize = 500;

pub(crate) fn describe<C: Clock>(
    registry: &ProcessRegistry,
    clock: &C,
    tenant_id: &TenantId,
) -> StatusReport {
    if registry.is_starting(tenant_id) {
        return StatusReport {
            status: ProcessStatus::Starting,
            ..StatusReport::absent(tenant_id.clone())
        };
    }
    match registry.lookup(tenant_id) {
        Some(handle) => snapshot(&handle, clock.epoch_ms()),
        None => StatusReport::absent(tenant_id.clone()),
    }
}

fn snapshot(handle: &WorkerHandle, now_ms: u64) -> StatusReport {
    let mut report = StatusReport::absent(handle.tenant_id().clone());
    report.started_at_ms = Some(handle.started_at_ms());

    match handle.probe() {
        None => {
            report.status = ProcessStatus::Running;
            report.pid = Some(handle.pid());
            report.uptime_ms = Some(now_ms.saturating_sub(handle.started_at_ms()));
            report.stdout_tail = non_empty(handle.redact(&handle.stdout().tail(EXCERPT_CHARS)));
            report.stderr_tail = non_empty(handle.redact(&handle.stderr().tail(EXCERPT_CHARS)));
        }
        Some(exit) => {
            report.status = ProcessStatus::Terminated;
            report.exit_code = exit.code;
            report.signal = exit.signal;
            (report.stdout_head, report.stdout_tail) = excerpts(handle, handle.stdout());
            (report.stderr_head, report.stderr_tail) = excerpts(handle, handle.stderr());
        }
    }
    report
}

fn non_empty(text: String) -> Option<String> {
    (!text.trim().is_empty()).then_some(text)
}

/// Head and tail of a finished stream; short streams only get a head.
fn excerpts(handle: &WorkerHandle, buffer: &OutputBuffer) -> (Option<String>, Option<String>) {
    let head = non_empty(handle.redact(&buffer.head(EXCERPT_CHARS)));
    if head.is_none() {
        return (None, None);
    }
    let long = buffer.dropped_bytes() > 0 || buffer.contents().chars().count() > EXCERPT_CHARS;
    let tail = if long {
        non_empty(handle.redact(&buffer.tail(EXCERPT_CHARS)))
    } else {
        None
    };
    (head, tail)
}

/// Multi-line text diagnostic for one report.
pub fn render(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "tenant: {}", report.tenant_id);
    let _ = writeln!(out, "status: {}", report.summary());
    if let Some(pid) = report.pid {
        let _ = writeln!(out, "pid: {pid}");
    }
    if let Some(uptime_ms) = report.uptime_ms {
        let _ = writeln!(out, "uptime: {}", format_uptime(uptime_ms / 1000));
    }

    let sections = [
        ("stdout (first)", &report.stdout_head),
        ("stdout (last)", &report.stdout_tail),
        ("stderr (first)", &report.stderr_head),
        ("stderr (last)", &report.stderr_tail),
    ];
    for (label, text) in sections {
        if let Some(text) = text {
            let _ = writeln!(out, "\n{label}:\n{}", text.trim_end());
        }
    }
    out
}

fn format_uptime(secs: u64) -> String {
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m{}s", s / 60, s % 60),
        s => format!("{}h{}m", s / 3600, (s % 3600) / 60),
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
