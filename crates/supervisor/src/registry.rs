// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory tenant to worker map

use crate::handle::WorkerHandle;
use bf_core::TenantId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of worker handles, at most one per tenant.
///
/// Map locks are held only for the duration of a lookup or insert. Callers
/// that check-then-spawn hold the tenant's async lock from [`tenant_lock`]
/// across the whole sequence.
///
/// [`tenant_lock`]: ProcessRegistry::tenant_lock
#[derive(Default)]
pub struct ProcessRegistry {
    workers: Mutex<HashMap<TenantId, Arc<WorkerHandle>>>,
    starting: Mutex<HashMap<TenantId, u32>>,
    locks: Mutex<HashMap<TenantId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the tenant's handle, returning the previous one.
    pub fn register(&self, handle: Arc<WorkerHandle>) -> Option<Arc<WorkerHandle>> {
        self.workers
            .lock()
            .insert(handle.tenant_id().clone(), handle)
    }

    pub fn lookup(&self, tenant_id: &TenantId) -> Option<Arc<WorkerHandle>> {
        self.workers.lock().get(tenant_id).cloned()
    }

    pub fn remove(&self, tenant_id: &TenantId) -> Option<Arc<WorkerHandle>> {
        self.workers.lock().remove(tenant_id)
    }

    /// Remove the tenant's handle only if it is still the one with `pid`.
    pub fn remove_if(&self, tenant_id: &TenantId, pid: u32) -> bool {
        let mut workers = self.workers.lock();
        match workers.get(tenant_id) {
            Some(handle) if handle.pid() == pid => {
                workers.remove(tenant_id);
                true
            }
            _ => false,
        }
    }

    /// Number of registered workers that are still alive.
    pub fn count(&self) -> usize {
        self.workers.lock().values().filter(|h| h.is_alive()).count()
    }

    /// Number of registered handles, live or terminated.
    pub fn len(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.lock().is_empty()
    }

    pub fn tenant_ids(&self) -> Vec<TenantId> {
        let mut ids: Vec<TenantId> = self.workers.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshot of all handles, ordered by tenant.
    pub fn handles(&self) -> Vec<Arc<WorkerHandle>> {
        let mut handles: Vec<Arc<WorkerHandle>> = self.workers.lock().values().cloned().collect();
        handles.sort_by(|a, b| a.tenant_id().cmp(b.tenant_id()));
        handles
    }

    /// Async lock serializing start/stop/restart for one tenant.
    pub fn tenant_lock(&self, tenant_id: &TenantId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(tenant_id.clone())
            .or_default()
            .clone()
    }

    /// Record that a launch for the tenant is inside its grace interval.
    pub(crate) fn mark_starting(&self, tenant_id: &TenantId) {
        *self.starting.lock().entry(tenant_id.clone()).or_insert(0) += 1;
    }

    pub(crate) fn clear_starting(&self, tenant_id: &TenantId) {
        let mut starting = self.starting.lock();
        if let Some(n) = starting.get_mut(tenant_id) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                starting.remove(tenant_id);
            }
        }
    }

    pub fn is_starting(&self, tenant_id: &TenantId) -> bool {
        self.starting.lock().contains_key(tenant_id)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
