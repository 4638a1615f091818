// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Defaulting for MySQL operator resources.
//!
//! Defaulting fills fields the user left empty. It is total (never fails),
//! idempotent, and always runs before validation so zero values it fills are
//! never reported as missing.

use crate::config::{self, OperatorConfig};
use crate::constants::{DEFAULT_BASE_SERVER_ID, DEFAULT_REPLICAS};
use crate::crd::{Backup, BackupSchedule, Cluster, Restore};
use crate::labels::ensure_operator_version_label;
use kube::ResourceExt;
use tracing::debug;

/// Fill omitted fields in place.
pub trait EnsureDefaults {
    /// Apply defaults taken from `config`.
    fn ensure_defaults_with(&mut self, config: &OperatorConfig);

    /// Apply defaults taken from the process-wide configuration.
    fn ensure_defaults(&mut self) {
        self.ensure_defaults_with(config::global());
    }
}

impl EnsureDefaults for Cluster {
    fn ensure_defaults_with(&mut self, config: &OperatorConfig) {
        if self.spec.replicas == 0 {
            self.spec.replicas = DEFAULT_REPLICAS;
            debug!(cluster = %self.name_any(), replicas = DEFAULT_REPLICAS, "Defaulted spec.replicas");
        }

        if self.spec.base_server_id == 0 {
            self.spec.base_server_id = DEFAULT_BASE_SERVER_ID;
            debug!(
                cluster = %self.name_any(),
                base_server_id = DEFAULT_BASE_SERVER_ID,
                "Defaulted spec.baseServerId"
            );
        }

        if self.spec.version.is_empty() {
            self.spec.version.clone_from(&config.default_version);
            debug!(cluster = %self.name_any(), version = %self.spec.version, "Defaulted spec.version");
        }
    }
}

impl EnsureDefaults for Backup {
    fn ensure_defaults_with(&mut self, config: &OperatorConfig) {
        if ensure_operator_version_label(&mut self.metadata, config.build_version()) {
            debug!(backup = %self.name_any(), "Stamped operator version label");
        }
    }
}

impl EnsureDefaults for BackupSchedule {
    fn ensure_defaults_with(&mut self, config: &OperatorConfig) {
        if ensure_operator_version_label(&mut self.metadata, config.build_version()) {
            debug!(backupschedule = %self.name_any(), "Stamped operator version label");
        }
    }
}

impl EnsureDefaults for Restore {
    fn ensure_defaults_with(&mut self, config: &OperatorConfig) {
        if ensure_operator_version_label(&mut self.metadata, config.build_version()) {
            debug!(restore = %self.name_any(), "Stamped operator version label");
        }
    }
}

#[cfg(test)]
#[path = "defaults_tests.rs"]
mod defaults_tests;
