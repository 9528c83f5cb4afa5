// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence boundary for tenant records.
//!
//! The supervisor consumes tenant records but does not own them. Whatever
//! backs the store (a database, a file) lives behind this trait.

use crate::tenant::{TenantId, TenantRecord};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read tenant store: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tenant store {path}: {message}")]
    Invalid { path: String, message: String },
    #[error("tenant store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TenantStore: Send + Sync + 'static {
    /// All tenant records, active or not.
    async fn tenants(&self) -> Result<Vec<TenantRecord>, StoreError>;

    /// Records flagged active; the respawn set at boot.
    async fn active_tenants(&self) -> Result<Vec<TenantRecord>, StoreError> {
        Ok(self
            .tenants()
            .await?
            .into_iter()
            .filter(|t| t.active)
            .collect())
    }

    async fn get(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, StoreError> {
        Ok(self
            .tenants()
            .await?
            .into_iter()
            .find(|t| &t.tenant_id == tenant_id))
    }
}
