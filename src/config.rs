// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration.
//!
//! The supported MySQL versions, the known backup executors and storage
//! providers, and the build version stamped onto resources are all injected
//! through [`OperatorConfig`] instead of being compiled in.
//!
//! Load order:
//!
//! 1. Built-in defaults ([`OperatorConfig::default`])
//! 2. Optional YAML file (`--config` or `MYSQL_OPERATOR_CONFIG`)
//! 3. Environment overrides (`MYSQL_OPERATOR_SUPPORTED_VERSIONS`)
//!
//! # Example
//!
//! ```yaml
//! supportedVersions: ["8.0.11", "8.0.12"]
//! defaultVersion: "8.0.11"
//! backupExecutors:
//!   - name: mysqldump
//!     requiresDatabases: true
//! storageProviders: ["s3"]
//! ```

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_BACKUP_EXECUTOR, DEFAULT_MYSQL_VERSION, DEFAULT_STORAGE_PROVIDER,
    SUPPORTED_VERSIONS_ENV,
};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Operator build version baked in at compile time, if the build set one.
pub const BUILD_VERSION: Option<&str> = option_env!("MYSQL_OPERATOR_BUILD_VERSION");

static GLOBAL_CONFIG: OnceLock<OperatorConfig> = OnceLock::new();

/// A backup tool the operator knows how to drive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupExecutorConfig {
    /// Executor name as written in `spec.executor.name`
    pub name: String,

    /// Whether a backup must list the databases to dump
    #[serde(default)]
    pub requires_databases: bool,
}

/// Runtime configuration for defaulting and validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorConfig {
    /// MySQL versions a `Cluster` may request
    pub supported_versions: Vec<String>,

    /// Version written into `spec.version` when the user leaves it empty
    pub default_version: String,

    /// Backup tools accepted in `spec.executor.name`
    pub backup_executors: Vec<BackupExecutorConfig>,

    /// Storage providers accepted in `spec.storageProvider.name`
    pub storage_providers: Vec<String>,

    /// Version recorded in the operator version label; `None` disables stamping
    pub build_version: Option<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            supported_versions: vec![DEFAULT_MYSQL_VERSION.to_string()],
            default_version: DEFAULT_MYSQL_VERSION.to_string(),
            backup_executors: vec![BackupExecutorConfig {
                name: DEFAULT_BACKUP_EXECUTOR.to_string(),
                requires_databases: true,
            }],
            storage_providers: vec![DEFAULT_STORAGE_PROVIDER.to_string()],
            build_version: BUILD_VERSION.map(str::to_string),
        }
    }
}

impl OperatorConfig {
    /// Load configuration following the documented precedence.
    ///
    /// # Arguments
    ///
    /// * `path` - Explicit config file; falls back to `MYSQL_OPERATOR_CONFIG`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is inconsistent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No operator config file given, using built-in defaults");
                Self::default()
            }
        };

        if let Ok(raw) = std::env::var(SUPPORTED_VERSIONS_ENV) {
            config.apply_supported_versions_override(&raw);
        }

        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML config file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded operator config file");
        Self::from_yaml_str(&raw)
    }

    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML or unknown value types.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Replace the supported versions with a comma separated list.
    ///
    /// Blank entries are dropped; an entirely blank value leaves the list as is.
    pub fn apply_supported_versions_override(&mut self, raw: &str) {
        let versions: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();

        if !versions.is_empty() {
            debug!(?versions, "Supported MySQL versions overridden from environment");
            self.supported_versions = versions;
        }
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a list is empty or the default
    /// version is not itself supported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supported_versions.is_empty() {
            return Err(ConfigError::Invalid(
                "supportedVersions must not be empty".to_string(),
            ));
        }
        if !self.is_supported_version(&self.default_version) {
            return Err(ConfigError::Invalid(format!(
                "defaultVersion '{}' is not in supportedVersions",
                self.default_version
            )));
        }
        if self.backup_executors.is_empty() {
            return Err(ConfigError::Invalid(
                "backupExecutors must not be empty".to_string(),
            ));
        }
        if self.storage_providers.is_empty() {
            return Err(ConfigError::Invalid(
                "storageProviders must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_supported_version(&self, version: &str) -> bool {
        self.supported_versions.iter().any(|v| v == version)
    }

    /// Look up a backup executor by name.
    #[must_use]
    pub fn executor(&self, name: &str) -> Option<&BackupExecutorConfig> {
        self.backup_executors.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn executor_names(&self) -> Vec<String> {
        self.backup_executors.iter().map(|e| e.name.clone()).collect()
    }

    #[must_use]
    pub fn is_known_storage_provider(&self, name: &str) -> bool {
        self.storage_providers.iter().any(|p| p == name)
    }

    /// Build version to stamp onto resources, ignoring an empty string.
    #[must_use]
    pub fn build_version(&self) -> Option<&str> {
        self.build_version.as_deref().filter(|v| !v.is_empty())
    }
}

/// Process-wide configuration used by `ensure_defaults()` and `validate()`.
///
/// Falls back to [`OperatorConfig::default`] when nothing was installed.
pub fn global() -> &'static OperatorConfig {
    GLOBAL_CONFIG.get_or_init(OperatorConfig::default)
}

/// Install the process-wide configuration. Call once at startup.
///
/// # Errors
///
/// Returns [`ConfigError::AlreadyInstalled`] if a configuration is already in
/// place, including the default one materialised by an earlier [`global`] call.
pub fn install_global(config: OperatorConfig) -> Result<(), ConfigError> {
    GLOBAL_CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInstalled)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
