// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version output specs

use crate::prelude::*;

#[test]
fn bf_without_args_prints_help() {
    cli()
        .passes()
        .stdout_has("Usage: bf")
        .stdout_has("start")
        .stdout_has("respawn")
        .stdout_has("daemon");
}

#[test]
fn bf_help_lists_tenant_commands() {
    let run = cli().args(&["--help"]).passes();
    for command in ["start", "stop", "restart", "running", "describe", "list"] {
        assert!(run.stdout().contains(command), "missing {command}");
    }
}

#[test]
fn bf_version_names_binary() {
    cli().args(&["--version"]).passes().stdout_has("bf ");
}

#[test]
fn bf_start_help_mentions_credential_env_vars() {
    cli()
        .args(&["start", "--help"])
        .passes()
        .stdout_has("--bot-token")
        .stdout_has("BF_BOT_TOKEN")
        .stdout_has("BF_MODEL_KEY");
}

#[test]
fn bfd_version_and_help() {
    cli().daemon().args(&["--version"]).passes().stdout_has("bfd ");
    cli()
        .daemon()
        .args(&["--help"])
        .passes()
        .stdout_has("USAGE:")
        .stdout_has("bf daemon start");
}

#[test]
fn bfd_rejects_unknown_arguments() {
    cli()
        .daemon()
        .args(&["--bogus"])
        .fails()
        .stderr_has("Usage: bfd");
}
