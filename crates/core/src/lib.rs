// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bf-core: Core types for the Bot Factory worker supervisor

pub mod clock;
pub mod secret;
pub mod status;
pub mod store;
pub mod tenant;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use secret::{Redactor, Secret};
pub use status::{ProcessStatus, StatusReport, WorkerExit};
pub use store::{StoreError, TenantStore};
pub use tenant::{LaunchRequest, TenantId, TenantRecord, DEFAULT_VECTOR_ENDPOINT};
