// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the daemon crate.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bf_adapters::FakeProcessAdapter;
use bf_core::test_support::MemoryTenantStore;
use bf_core::FakeClock;
use bf_supervisor::{LauncherConfig, ProcessRegistry, Supervisor, SupervisorConfig, SupervisorDeps};

pub(crate) type TestSupervisor = Supervisor<FakeProcessAdapter, FakeClock>;

/// Supervisor over the fake process adapter with short timings.
pub(crate) fn fake_supervisor() -> (Arc<TestSupervisor>, FakeProcessAdapter) {
    let process = FakeProcessAdapter::new();
    let supervisor = Supervisor::new(
        SupervisorDeps {
            process: process.clone(),
            registry: Arc::new(ProcessRegistry::new()),
        },
        FakeClock::new(),
        SupervisorConfig {
            launcher: LauncherConfig {
                program: PathBuf::from("/bin/sh"),
                grace: Duration::from_millis(20),
                ..LauncherConfig::default()
            },
            stop_timeout: Duration::from_millis(50),
        },
    );
    (Arc::new(supervisor), process)
}

pub(crate) fn empty_store() -> MemoryTenantStore {
    MemoryTenantStore::new(Vec::new())
}
