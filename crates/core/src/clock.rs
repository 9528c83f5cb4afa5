// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so worker timestamps and uptimes are testable.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, used for elapsed-time measurement.
    fn now(&self) -> Instant;

    /// Wall-clock milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

struct FakeClockState {
    instant: Instant,
    epoch_ms: u64,
}

/// Manually advanced clock for tests.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockState>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockState {
                instant: Instant::now(),
                epoch_ms: 1_000_000,
            })),
        }
    }

    /// Move both clocks forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut state = self.inner.lock();
        state.instant += by;
        state.epoch_ms += by.as_millis() as u64;
    }

    pub fn set_epoch_ms(&self, epoch_ms: u64) {
        self.inner.lock().epoch_ms = epoch_ms;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().instant
    }

    fn epoch_ms(&self) -> u64 {
        self.inner.lock().epoch_ms
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
