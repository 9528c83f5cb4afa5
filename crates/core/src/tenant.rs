// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tenant identity and launch inputs.
//!
//! A tenant is one end user owning at most one worker process. Its durable
//! record lives outside the supervisor (see [`crate::TenantStore`]).

use crate::secret::Secret;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Vector-service endpoint used when neither the caller nor config sets one.
pub const DEFAULT_VECTOR_ENDPOINT: &str = "http://localhost:6333";

/// Stable tenant identifier (chat user IDs are numeric, but any string works).
///
/// Deserializes from either a string or an integer, so `tenant_id = 42`
/// and `tenant_id = "42"` are the same tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl<'de> Deserialize<'de> for TenantId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Collection name used when a record does not carry one: `user_<id>`.
    pub fn default_collection(&self) -> String {
        format!("user_{}", self.0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl Borrow<str> for TenantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TenantId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TenantId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Persisted tenant record, supplied wholesale by the store at boot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRecord {
    #[serde(alias = "telegram_user_id")]
    pub tenant_id: TenantId,
    pub bot_token: Secret,
    #[serde(alias = "openai_key")]
    pub model_key: Secret,
    #[serde(default, alias = "qdrant_collection")]
    pub collection: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TenantRecord {
    pub fn new(
        tenant_id: impl Into<TenantId>,
        bot_token: impl Into<Secret>,
        model_key: impl Into<Secret>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            bot_token: bot_token.into(),
            model_key: model_key.into(),
            collection: None,
            active: true,
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Collection name, falling back to `user_<id>`.
    pub fn collection_name(&self) -> String {
        self.collection
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.tenant_id.default_collection())
    }

    /// Build the launch inputs for this record against `endpoint`.
    pub fn launch_request(&self, endpoint: Option<&str>) -> LaunchRequest {
        LaunchRequest {
            bot_token: self.bot_token.clone(),
            model_key: self.model_key.clone(),
            collection: self.collection_name(),
            endpoint: endpoint.map(str::to_string),
        }
    }
}

/// Everything the launcher needs to start one tenant's worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub bot_token: Secret,
    pub model_key: Secret,
    pub collection: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl LaunchRequest {
    pub fn new(
        bot_token: impl Into<Secret>,
        model_key: impl Into<Secret>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            bot_token: bot_token.into(),
            model_key: model_key.into(),
            collection: collection.into(),
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Endpoint to pass to the worker, or `fallback` when unset or blank.
    pub fn endpoint_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.endpoint.as_deref() {
            Some(e) if !e.trim().is_empty() => e,
            _ => fallback,
        }
    }
}

#[cfg(test)]
#[path = "tenant_tests.rs"]
mod tests;
