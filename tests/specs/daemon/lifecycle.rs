// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs
//!
//! Verify daemon start/stop/status and that stopping the daemon takes
//! its workers down with it.

use crate::prelude::*;

#[test]
fn status_when_not_running() {
    let workspace = Workspace::new();
    workspace
        .bf()
        .args(&["daemon", "status"])
        .passes()
        .stdout_eq("Daemon not running\n");
}

#[test]
fn status_json_when_not_running() {
    let workspace = Workspace::new();
    let run = workspace
        .bf()
        .args(&["-o", "json", "daemon", "status"])
        .passes();
    assert_eq!(run.json()["status"], "not_running");
}

#[test]
fn start_then_status_then_stop() {
    let workspace = Workspace::new();

    workspace
        .bf()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon started");

    workspace
        .bf()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Status: running")
        .stdout_has("Workers: 0 running, 0 registered");

    workspace
        .bf()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon stopped");

    workspace
        .bf()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn second_start_reports_already_running() {
    let workspace = Workspace::new();
    workspace.bf().args(&["daemon", "start"]).passes();
    workspace
        .bf()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon already running");
}

#[test]
fn stop_when_not_running_is_noop() {
    let workspace = Workspace::new();
    workspace
        .bf()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn stop_removes_socket_and_pid_files() {
    let workspace = Workspace::new();
    workspace.bf().args(&["daemon", "start"]).passes();
    assert!(workspace.state_path().join("daemon.sock").exists());
    assert!(workspace.daemon_pid().is_some());

    workspace.bf().args(&["daemon", "stop"]).passes();

    assert!(!workspace.state_path().join("daemon.sock").exists());
    assert!(workspace.daemon_pid().is_none());
}

#[test]
fn daemon_stop_terminates_workers() {
    let workspace = Workspace::new();
    workspace.bf().args(&["daemon", "start"]).passes();

    let report = workspace
        .bf()
        .args(&["-o", "json", "start", "42"])
        .env("BF_BOT_TOKEN", "123456:TOKEN42")
        .env("BF_MODEL_KEY", "sk-key-42")
        .passes()
        .json();
    let pid = report["pid"].as_u64().expect("running worker has a pid") as u32;
    assert!(process_alive(pid));

    workspace.bf().args(&["daemon", "stop"]).passes();

    let gone = wait_for(SPEC_WAIT_MAX_MS, || !process_alive(pid));
    assert!(gone, "worker {pid} outlived the daemon");
}

#[test]
fn logs_show_startup() {
    let workspace = Workspace::new();
    workspace.bf().args(&["daemon", "start"]).passes();

    let found = wait_for(SPEC_WAIT_MAX_MS, || {
        workspace.daemon_log().contains("bfd: starting")
    });
    assert!(found, "daemon log:\n{}", workspace.daemon_log());

    workspace
        .bf()
        .args(&["daemon", "logs", "-n", "100"])
        .passes()
        .stdout_has("bfd: starting");
}
