// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle specs
//!
//! Start, inspect, restart and stop per-tenant workers through a
//! running daemon.

use crate::prelude::*;

const TOKEN: &str = "123456:SECRETTOKEN";
const KEY: &str = "sk-secretkey";

fn started(workspace: &Workspace) {
    workspace.bf().args(&["daemon", "start"]).passes();
}

fn start_42(workspace: &Workspace) -> RunAssert {
    workspace
        .bf()
        .args(&["start", "42"])
        .env("BF_BOT_TOKEN", TOKEN)
        .env("BF_MODEL_KEY", KEY)
        .run()
}

#[test]
fn start_reports_running_worker() {
    let workspace = Workspace::new();
    started(&workspace);

    start_42(&workspace)
        .stdout_has("Started worker for tenant 42: running (pid ")
        .stderr_lacks("Error");

    workspace
        .bf()
        .args(&["running", "42"])
        .passes()
        .stdout_eq("running\n");
}

#[test]
fn describe_shows_worker_output() {
    let workspace = Workspace::new();
    started(&workspace);
    start_42(&workspace);

    workspace
        .bf()
        .args(&["describe", "42"])
        .passes()
        .stdout_has("tenant: 42")
        .stdout_has("status: running")
        .stdout_has("ready");
}

#[test]
fn describe_unknown_tenant_is_absent() {
    let workspace = Workspace::new();
    started(&workspace);

    workspace
        .bf()
        .args(&["describe", "7"])
        .passes()
        .stdout_has("status: absent");
}

#[test]
fn stop_then_running_reports_not_running() {
    let workspace = Workspace::new();
    started(&workspace);
    start_42(&workspace);

    workspace
        .bf()
        .args(&["stop", "42"])
        .passes()
        .stdout_has("Stopped worker for tenant 42");

    workspace
        .bf()
        .args(&["running", "42"])
        .exits_with(1)
        .stdout_eq("not running\n");
}

#[test]
fn stop_unregistered_tenant_succeeds() {
    let workspace = Workspace::new();
    started(&workspace);

    workspace
        .bf()
        .args(&["stop", "9"])
        .passes()
        .stdout_has("No worker registered for tenant 9");
}

#[test]
fn restart_replaces_process() {
    let workspace = Workspace::new();
    started(&workspace);
    workspace.tenants(&["42"]);

    let first = workspace
        .bf()
        .args(&["-o", "json", "start", "42"])
        .passes()
        .json();
    let second = workspace
        .bf()
        .args(&["-o", "json", "restart", "42"])
        .passes()
        .json();

    let (old, new) = (first["pid"].as_u64(), second["pid"].as_u64());
    assert!(old.is_some() && new.is_some());
    assert_ne!(old, new);
    assert!(!process_alive(old.unwrap_or_default() as u32));
}

#[test]
fn list_shows_each_registered_tenant() {
    let workspace = Workspace::new();
    started(&workspace);
    workspace.tenants(&["1", "2"]);

    workspace.bf().args(&["start", "1"]).passes();
    workspace.bf().args(&["start", "2"]).passes();

    workspace
        .bf()
        .args(&["list"])
        .passes()
        .stdout_has("TENANT")
        .stdout_has("running");

    let reports = workspace.bf().args(&["-o", "json", "list"]).passes().json();
    assert_eq!(reports.as_array().map(Vec::len), Some(2));

    workspace
        .bf()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Workers: 2 running, 2 registered");
}

#[test]
fn start_uses_stored_credentials() {
    let workspace = Workspace::new();
    started(&workspace);
    workspace.tenants(&["5"]);

    workspace
        .bf()
        .args(&["start", "5"])
        .passes()
        .stdout_has("running");
}

#[test]
fn start_unknown_tenant_exits_3() {
    let workspace = Workspace::new();
    started(&workspace);

    workspace
        .bf()
        .args(&["start", "404"])
        .exits_with(3)
        .stderr_has("404");
}

#[test]
fn crashing_worker_reports_redacted_diagnostics() {
    let workspace = Workspace::with_worker(CRASHING_WORKER);
    started(&workspace);

    let run = start_42(&workspace);
    assert_eq!(run.stdout(), "");
    run.stderr_has("invalid token 1234****")
        .stderr_has("tenant 42")
        .stderr_lacks(TOKEN);

    workspace
        .bf()
        .args(&["running", "42"])
        .exits_with(1)
        .stdout_eq("not running\n");
}

#[test]
fn credentials_never_reach_daemon_log() {
    let workspace = Workspace::with_worker(CRASHING_WORKER);
    started(&workspace);
    start_42(&workspace);

    let log = workspace.daemon_log();
    assert!(!log.contains(TOKEN), "token leaked into daemon log:\n{log}");
    assert!(!log.contains(KEY), "model key leaked into daemon log:\n{log}");
}
