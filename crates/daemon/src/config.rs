// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon settings: optional `config.toml` plus environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bf_adapters::DEFAULT_OUTPUT_CAPACITY;
use bf_core::DEFAULT_VECTOR_ENDPOINT;
use bf_supervisor::{
    CredentialChannel, LauncherConfig, SupervisorConfig, DEFAULT_GRACE, DEFAULT_STOP_TIMEOUT,
};
use serde::Deserialize;
use thiserror::Error;

use crate::env;

/// Default worker health-check period
pub const DEFAULT_HEALTH_CHECK: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// `[worker]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerSettings {
    pub program: Option<PathBuf>,
    pub entry_point: Option<PathBuf>,
    pub args: Vec<String>,
    pub credential_channel: CredentialChannel,
    pub cwd: Option<PathBuf>,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub worker: WorkerSettings,
    pub vector_endpoint: Option<String>,
    pub grace_ms: Option<u64>,
    pub stop_timeout_ms: Option<u64>,
    pub health_check_ms: Option<u64>,
    pub output_capacity: Option<usize>,
    pub tenants_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `BF_*` environment overrides on top of file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(program) = env::worker_binary() {
            self.worker.program = Some(program);
        }
        if let Some(entry) = env::worker_entry() {
            self.worker.entry_point = Some(entry);
        }
        if let Some(url) = env::vector_url() {
            self.vector_endpoint = Some(url);
        }
        if let Some(grace) = env::grace_ms() {
            self.grace_ms = Some(grace.as_millis() as u64);
        }
        if let Some(timeout) = env::stop_timeout_ms() {
            self.stop_timeout_ms = Some(timeout.as_millis() as u64);
        }
        if let Some(period) = env::health_check_ms() {
            self.health_check_ms = Some(period.as_millis() as u64);
        }
        self
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        let defaults = LauncherConfig::default();
        SupervisorConfig {
            launcher: LauncherConfig {
                program: self.worker.program.clone().unwrap_or(defaults.program),
                entry_point: self.worker.entry_point.clone(),
                extra_args: self.worker.args.clone(),
                credential_channel: self.worker.credential_channel,
                default_endpoint: self
                    .vector_endpoint
                    .clone()
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_VECTOR_ENDPOINT.to_string()),
                grace: self
                    .grace_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_GRACE),
                output_capacity: self.output_capacity.unwrap_or(DEFAULT_OUTPUT_CAPACITY),
                cwd: self.worker.cwd.clone(),
            },
            stop_timeout: self
                .stop_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_STOP_TIMEOUT),
        }
    }

    /// Health-check period; zero is clamped to one millisecond.
    pub fn health_check_interval(&self) -> Duration {
        self.health_check_ms
            .map(|ms| Duration::from_millis(ms.max(1)))
            .unwrap_or(DEFAULT_HEALTH_CHECK)
    }

    /// Tenant file location, relative paths resolved against `state_dir`.
    pub fn tenants_path(&self, state_dir: &Path) -> PathBuf {
        match &self.tenants_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => state_dir.join(path),
            None => state_dir.join("tenants.toml"),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
