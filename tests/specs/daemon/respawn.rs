// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Respawn specs
//!
//! The daemon starts a worker for every active tenant when it boots, and
//! `bf respawn` does the same on demand.

use crate::prelude::*;

#[test]
fn daemon_start_respawns_active_tenants() {
    let workspace = Workspace::new();
    workspace.tenants(&["1", "2", "3"]);

    workspace.bf().args(&["daemon", "start"]).passes();

    let all_running = wait_for(SPEC_WAIT_MAX_MS, || {
        workspace
            .bf()
            .args(&["daemon", "status"])
            .run()
            .stdout()
            .contains("Workers: 3 running")
    });
    assert!(all_running, "daemon log:\n{}", workspace.daemon_log());
}

#[test]
fn inactive_tenants_are_skipped() {
    let workspace = Workspace::new();
    workspace.file(
        "tenants.toml",
        r#"
[[tenant]]
tenant_id = "1"
bot_token = "123456:TOKEN1"
model_key = "sk-key-1"

[[tenant]]
tenant_id = "2"
bot_token = "123456:TOKEN2"
model_key = "sk-key-2"
active = false
"#,
    );
    workspace.bf().args(&["daemon", "start"]).passes();

    let respawned = wait_for(SPEC_WAIT_MAX_MS, || {
        workspace
            .bf()
            .args(&["running", "1"])
            .run()
            .stdout()
            == "running\n"
    });
    assert!(respawned, "daemon log:\n{}", workspace.daemon_log());

    workspace.bf().args(&["running", "2"]).exits_with(1);
}

#[test]
fn respawn_command_reports_counts() {
    let workspace = Workspace::new();
    workspace.bf().args(&["daemon", "start"]).passes();
    workspace.tenants(&["8", "9"]);

    workspace
        .bf()
        .args(&["respawn"])
        .passes()
        .stdout_has("Respawned 2/2 workers");

    workspace.bf().args(&["running", "8"]).passes();
    workspace.bf().args(&["running", "9"]).passes();
}

#[test]
fn respawn_with_failing_workers_counts_successes_only() {
    let workspace = Workspace::with_worker(CRASHING_WORKER);
    workspace.bf().args(&["daemon", "start"]).passes();
    workspace.tenants(&["8"]);

    workspace
        .bf()
        .args(&["respawn"])
        .passes()
        .stdout_has("Respawned 0/1 workers");
}
