// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exit codes and error messages when things go wrong

use crate::prelude::*;

#[test]
fn tenant_commands_exit_2_without_daemon() {
    let workspace = Workspace::new();

    for args in [
        &["start", "42"][..],
        &["stop", "42"],
        &["running", "42"],
        &["describe", "42"],
        &["list"],
        &["respawn"],
    ] {
        workspace
            .bf()
            .args(args)
            .exits_with(2)
            .stderr_has("Daemon not running");
    }
}

#[test]
fn tenant_commands_do_not_start_daemon() {
    let workspace = Workspace::new();
    workspace.bf().args(&["list"]).exits_with(2);
    assert!(workspace.daemon_pid().is_none());
}

#[test]
fn unknown_subcommand_is_usage_error() {
    cli()
        .args(&["frobnicate"])
        .fails()
        .stderr_has("unrecognized subcommand");
}

#[test]
fn start_requires_tenant_id() {
    cli().args(&["start"]).fails().stderr_has("<TENANT_ID>");
}

#[test]
fn invalid_config_is_reported_on_daemon_start() {
    let workspace = Workspace::new();
    workspace.file("config.toml", "bogus = true\n");

    workspace
        .bf()
        .args(&["daemon", "start"])
        .fails()
        .stderr_has("invalid config");
}
