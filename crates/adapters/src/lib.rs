// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for worker processes and their captured output

pub mod output;
pub mod process;
pub mod traced;

pub use output::{head_chars, tail_chars, OutputBuffer, DEFAULT_OUTPUT_CAPACITY};
pub use process::{
    CommandArg, ExitSender, ExitWatch, OsProcessAdapter, ProcessAdapter, ProcessError, Signal,
    SpawnedWorker, WorkerCommand,
};
pub use traced::TracedProcess;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcess, FakeProcessAdapter, ProcessCall, SpawnBehavior};
