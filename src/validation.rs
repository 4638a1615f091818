// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Validation for MySQL operator resources.
//!
//! Validation is read-only and runs after defaulting. It never stops at the
//! first problem: every violation is collected with the path of the field it
//! concerns, and the caller receives them all in one [`ValidationErrors`].
//!
//! # Example
//!
//! ```rust
//! use mysql_operator::crd::{Cluster, ClusterSpec};
//! use mysql_operator::defaults::EnsureDefaults;
//! use mysql_operator::validation::Validate;
//!
//! let mut cluster = Cluster::new("mycluster", ClusterSpec { replicas: 10, ..Default::default() });
//! cluster.ensure_defaults();
//!
//! let errs = cluster.validate().unwrap_err();
//! assert!(errs.contains_field("spec.replicas"));
//! ```

use crate::config::{self, OperatorConfig};
use crate::constants::{
    CLUSTER_NAME_MAX_LEN, GENERATE_NAME_SUFFIX_LEN, KIND_BACKUP, KIND_BACKUP_SCHEDULE, KIND_CLUSTER,
    KIND_RESTORE, MAX_BASE_SERVER_ID, MAX_INNODB_CLUSTER_MEMBERS,
};
use crate::crd::{Backup, BackupSchedule, BackupSpec, Cluster, LocalObjectReference, Restore};
use crate::errors::ScheduleError;
use crate::field_errors::{FieldError, ValidationErrors};
use crate::schedule::Schedule;
use tracing::debug;

/// Check an object against the operator's rules.
pub trait Validate {
    /// Validate against the rules in `config`.
    ///
    /// # Errors
    ///
    /// Returns every violation found, in discovery order.
    fn validate_with(&self, config: &OperatorConfig) -> Result<(), ValidationErrors>;

    /// Validate against the process-wide configuration.
    ///
    /// # Errors
    ///
    /// Returns every violation found, in discovery order.
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_with(config::global())
    }
}

/// Longest `generateName` prefix that still yields a valid cluster name.
const GENERATE_NAME_MAX_LEN: usize = CLUSTER_NAME_MAX_LEN - GENERATE_NAME_SUFFIX_LEN;

/// Join a parent path and a child field name.
fn path(parent: &str, child: &str) -> String {
    format!("{parent}.{child}")
}

/// A present reference must name something.
fn validate_reference_name(
    reference: Option<&LocalObjectReference>,
    field: &str,
    errs: &mut ValidationErrors,
) {
    if let Some(reference) = reference {
        if reference.name.trim().is_empty() {
            errs.push(FieldError::required(path(field, "name"), "name must be set"));
        }
    }
}

/// A reference that must be present and name something.
fn validate_required_reference(
    reference: Option<&LocalObjectReference>,
    field: &str,
    what: &str,
    errs: &mut ValidationErrors,
) {
    match reference {
        None => errs.push(FieldError::required(field, format!("{what} must be set"))),
        Some(_) => validate_reference_name(reference, field, errs),
    }
}

// ============================================================================
// Cluster
// ============================================================================

impl Validate for Cluster {
    fn validate_with(&self, config: &OperatorConfig) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        let spec = &self.spec;

        match (&self.metadata.name, &self.metadata.generate_name) {
            (Some(name), _) if name.len() > CLUSTER_NAME_MAX_LEN => {
                errs.push(FieldError::too_long("metadata.name", name, CLUSTER_NAME_MAX_LEN));
            }
            (None, Some(prefix)) if prefix.len() > GENERATE_NAME_MAX_LEN => {
                errs.push(FieldError::too_long(
                    "metadata.generateName",
                    prefix,
                    GENERATE_NAME_MAX_LEN,
                ));
            }
            _ => {}
        }

        let replicas_in_range = (1..=MAX_INNODB_CLUSTER_MEMBERS).contains(&spec.replicas);
        if !replicas_in_range {
            errs.push(FieldError::invalid(
                "spec.replicas",
                spec.replicas,
                format!("must be in the range 1 to {MAX_INNODB_CLUSTER_MEMBERS}"),
            ));
        }

        let base_in_range = (1..=MAX_BASE_SERVER_ID).contains(&spec.base_server_id);
        if !base_in_range {
            errs.push(FieldError::invalid(
                "spec.baseServerId",
                spec.base_server_id,
                format!("must be in the range 1 to {MAX_BASE_SERVER_ID}"),
            ));
        }

        if replicas_in_range && base_in_range {
            let last =
                u64::from(spec.base_server_id) + u64::from(spec.replicas.unsigned_abs()) - 1;
            if last > u64::from(MAX_BASE_SERVER_ID) {
                errs.push(FieldError::invalid(
                    "spec.baseServerId",
                    spec.base_server_id,
                    format!(
                        "baseServerId + replicas - 1 must not exceed {MAX_BASE_SERVER_ID}, got {last}"
                    ),
                ));
            }
        }

        if spec.version.is_empty() {
            errs.push(FieldError::required("spec.version", "version must be set"));
        } else if !config.is_supported_version(&spec.version) {
            errs.push(FieldError::not_supported(
                "spec.version",
                &spec.version,
                &config.supported_versions,
            ));
        }

        validate_reference_name(spec.secret_ref.as_ref(), "spec.secretRef", &mut errs);
        validate_reference_name(spec.config_ref.as_ref(), "spec.configRef", &mut errs);
        validate_reference_name(spec.ssl_secret_ref.as_ref(), "spec.sslSecretRef", &mut errs);

        if let (Some(secret), Some(ssl)) = (&spec.secret_ref, &spec.ssl_secret_ref) {
            if !ssl.name.is_empty() && ssl.name == secret.name {
                errs.push(FieldError::forbidden(
                    "spec.sslSecretRef",
                    "must not reference the root password secret named in spec.secretRef",
                ));
            }
        }

        finish(KIND_CLUSTER, self.metadata.name.as_deref(), errs)
    }
}

// ============================================================================
// Backup
// ============================================================================

/// Validate a backup spec rooted at `field` (`spec` or `spec.backupTemplate`).
fn validate_backup_spec(
    spec: &BackupSpec,
    field: &str,
    config: &OperatorConfig,
    errs: &mut ValidationErrors,
) {
    let executor_field = path(field, "executor");
    match &spec.executor {
        None => errs.push(FieldError::required(
            &executor_field,
            "backup executor must be set",
        )),
        Some(executor) => {
            let name_field = path(&executor_field, "name");
            let databases_field = path(&executor_field, "databases");

            if executor.name.is_empty() {
                errs.push(FieldError::required(&name_field, "executor name must be set"));
            } else {
                match config.executor(&executor.name) {
                    None => errs.push(FieldError::not_supported(
                        &name_field,
                        &executor.name,
                        &config.executor_names(),
                    )),
                    Some(known) if known.requires_databases && executor.databases.is_empty() => {
                        errs.push(FieldError::required(
                            &databases_field,
                            format!(
                                "at least one database must be listed for executor '{}'",
                                executor.name
                            ),
                        ));
                    }
                    Some(_) => {}
                }
            }

            for (i, database) in executor.databases.iter().enumerate() {
                if database.trim().is_empty() {
                    errs.push(FieldError::invalid(
                        format!("{databases_field}[{i}]"),
                        database,
                        "database name must not be blank",
                    ));
                }
            }
        }
    }

    let provider_field = path(field, "storageProvider");
    match &spec.storage_provider {
        None => errs.push(FieldError::required(
            &provider_field,
            "storage provider must be set",
        )),
        Some(provider) => {
            let name_field = path(&provider_field, "name");
            if provider.name.is_empty() {
                errs.push(FieldError::required(&name_field, "storage provider name must be set"));
            } else if !config.is_known_storage_provider(&provider.name) {
                errs.push(FieldError::not_supported(
                    &name_field,
                    &provider.name,
                    &config.storage_providers,
                ));
            }
            validate_reference_name(
                provider.secret_ref.as_ref(),
                &path(&provider_field, "secretRef"),
                errs,
            );
        }
    }

    validate_required_reference(
        spec.cluster.as_ref(),
        &path(field, "cluster"),
        "cluster reference",
        errs,
    );
}

impl Validate for Backup {
    fn validate_with(&self, config: &OperatorConfig) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        validate_backup_spec(&self.spec, "spec", config, &mut errs);
        finish(KIND_BACKUP, self.metadata.name.as_deref(), errs)
    }
}

// ============================================================================
// BackupSchedule
// ============================================================================

impl Validate for BackupSchedule {
    fn validate_with(&self, config: &OperatorConfig) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();

        match Schedule::parse(&self.spec.schedule) {
            Ok(_) => {}
            Err(ScheduleError::Empty) => {
                errs.push(FieldError::required("spec.schedule", "schedule must be set"));
            }
            Err(e) => {
                errs.push(FieldError::invalid(
                    "spec.schedule",
                    &self.spec.schedule,
                    e.to_string(),
                ));
            }
        }

        validate_backup_spec(
            &self.spec.backup_template,
            "spec.backupTemplate",
            config,
            &mut errs,
        );

        finish(KIND_BACKUP_SCHEDULE, self.metadata.name.as_deref(), errs)
    }
}

// ============================================================================
// Restore
// ============================================================================

impl Validate for Restore {
    fn validate_with(&self, _config: &OperatorConfig) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();

        validate_required_reference(
            self.spec.cluster_ref.as_ref(),
            "spec.clusterRef",
            "cluster reference",
            &mut errs,
        );
        validate_required_reference(
            self.spec.backup_ref.as_ref(),
            "spec.backupRef",
            "backup reference",
            &mut errs,
        );

        finish(KIND_RESTORE, self.metadata.name.as_deref(), errs)
    }
}

fn finish(kind: &str, name: Option<&str>, errs: ValidationErrors) -> Result<(), ValidationErrors> {
    if !errs.is_empty() {
        debug!(
            kind,
            name = name.unwrap_or_default(),
            violations = errs.len(),
            "Validation failed"
        );
    }
    errs.into_result()
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod validation_tests;
