// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed tenant store.
//!
//! ```toml
//! [[tenant]]
//! tenant_id = 42
//! bot_token = "..."
//! model_key = "..."
//! collection = "user_42"   # optional
//! active = true            # optional
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bf_core::{StoreError, TenantRecord, TenantStore};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TenantFile {
    #[serde(default, rename = "tenant")]
    tenants: Vec<TenantRecord>,
}

/// Reads tenant records from a TOML file on every call, so edits are
/// picked up without a daemon restart.
#[derive(Debug, Clone)]
pub struct FileTenantStore {
    path: PathBuf,
}

impl FileTenantStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TenantStore for FileTenantStore {
    async fn tenants(&self) -> Result<Vec<TenantRecord>, StoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let file: TenantFile = toml::from_str(&text).map_err(|e| StoreError::Invalid {
            path: self.path.display().to_string(),
            message: e.message().to_string(),
        })?;
        Ok(file.tenants)
    }
}

#[cfg(test)]
#[path = "tenants_tests.rs"]
mod tests;
