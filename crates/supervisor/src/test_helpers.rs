// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the supervisor crate.

use crate::{LauncherConfig, ProcessRegistry, Supervisor, SupervisorConfig, SupervisorDeps};
use bf_adapters::{FakeProcessAdapter, OsProcessAdapter};
use bf_core::FakeClock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type TestSupervisor = Supervisor<FakeProcessAdapter, FakeClock>;

pub(crate) struct TestContext {
    pub supervisor: Arc<TestSupervisor>,
    pub process: FakeProcessAdapter,
    pub clock: FakeClock,
    pub registry: Arc<ProcessRegistry>,
}

/// Launcher settings with short timings; `/bin/sh` stands in for the program.
pub(crate) fn fast_config() -> SupervisorConfig {
    SupervisorConfig {
        launcher: LauncherConfig {
            program: PathBuf::from("/bin/sh"),
            grace: Duration::from_millis(20),
            ..LauncherConfig::default()
        },
        stop_timeout: Duration::from_millis(50),
    }
}

pub(crate) fn setup() -> TestContext {
    setup_with(fast_config())
}

pub(crate) fn setup_with(config: SupervisorConfig) -> TestContext {
    let process = FakeProcessAdapter::new();
    let clock = FakeClock::new();
    let registry = Arc::new(ProcessRegistry::new());
    let supervisor = Supervisor::new(
        SupervisorDeps {
            process: process.clone(),
            registry: Arc::clone(&registry),
        },
        clock.clone(),
        config,
    );
    TestContext {
        supervisor: Arc::new(supervisor),
        process,
        clock,
        registry,
    }
}

/// Supervisor over real processes running `script` through `/bin/sh -c`.
pub(crate) fn os_supervisor(
    script: &str,
    stop_timeout: Duration,
) -> Supervisor<OsProcessAdapter, FakeClock> {
    let config = SupervisorConfig {
        launcher: LauncherConfig {
            program: PathBuf::from("/bin/sh"),
            extra_args: vec!["-c".to_string(), script.to_string(), "worker".to_string()],
            grace: Duration::from_millis(300),
            ..LauncherConfig::default()
        },
        stop_timeout,
    };
    Supervisor::new(
        SupervisorDeps {
            process: OsProcessAdapter::new(),
            registry: Arc::new(ProcessRegistry::new()),
        },
        FakeClock::new(),
        config,
    )
}
