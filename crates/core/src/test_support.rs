// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::store::{StoreError, TenantStore};
use crate::tenant::{LaunchRequest, TenantRecord};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Active record with deterministic credentials: `tok<id>` / `sk-<id>`.
pub fn tenant_record(id: &str) -> TenantRecord {
    TenantRecord::new(id, format!("tok{id}"), format!("sk-{id}"))
}

/// Launch request matching [`tenant_record`].
pub fn launch_request(id: &str) -> LaunchRequest {
    tenant_record(id).launch_request(None)
}

/// In-memory tenant store.
#[derive(Clone, Default)]
pub struct MemoryTenantStore {
    records: Arc<Mutex<Vec<TenantRecord>>>,
    fail: Arc<Mutex<Option<String>>>,
}

impl MemoryTenantStore {
    pub fn new(records: Vec<TenantRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            fail: Arc::new(Mutex::new(None)),
        }
    }

    pub fn insert(&self, record: TenantRecord) {
        let mut records = self.records.lock();
        records.retain(|r| r.tenant_id != record.tenant_id);
        records.push(record);
    }

    /// Make every subsequent read fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.fail.lock() = Some(message.to_string());
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn tenants(&self) -> Result<Vec<TenantRecord>, StoreError> {
        if let Some(message) = self.fail.lock().clone() {
            return Err(StoreError::Unavailable(message));
        }
        Ok(self.records.lock().clone())
    }
}
