// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic worker health check

use crate::supervisor::Supervisor;
use bf_adapters::ProcessAdapter;
use bf_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Probe every registered worker each `period`, logging new crashes.
///
/// A crash is detected at most one `period` after the worker dies.
pub fn spawn_health_check<P, C>(supervisor: Arc<Supervisor<P, C>>, period: Duration) -> JoinHandle<()>
where
    P: ProcessAdapter,
    C: Clock,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let crashed = supervisor.reap();
            if !crashed.is_empty() {
                tracing::info!(
                    crashed = crashed.len(),
                    running = supervisor.running_count(),
                    "health check found exited workers"
                );
            }
        }
    })
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
