// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for MySQL cluster management.
//!
//! This module defines the four `mysql.oracle.com/v1alpha1` resources the
//! operator serves. Field names on the wire are fixed; stored documents written
//! by earlier operator releases must keep deserializing.
//!
//! # Resource Types
//!
//! - [`Cluster`] - A MySQL InnoDB group replication cluster
//! - [`Backup`] - A one-off backup of a `Cluster`
//! - [`BackupSchedule`] - A cron schedule that stamps out `Backup` objects
//! - [`Restore`] - Restores a `Backup` into a `Cluster`
//!
//! Every entity carries its identity in the standard `metadata` header generated
//! by kube; use [`kube::ResourceExt`] for `name_any()`, `namespace()` and
//! `labels()`.
//!
//! # Example: Creating a Cluster
//!
//! ```rust,no_run
//! use mysql_operator::crd::{Cluster, ClusterSpec};
//!
//! let cluster = Cluster::new(
//!     "mycluster",
//!     ClusterSpec {
//!         replicas: 3,
//!         multi_master: true,
//!         ..Default::default()
//!     },
//! );
//! assert!(cluster.requires_secret());
//! ```

use crate::constants::{ROOT_PASSWORD_SECRET_SUFFIX, SSL_SECRET_SUFFIX};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Affinity, PersistentVolumeClaim};
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(v: &bool) -> bool {
    !*v
}

/// Decode `null` as the empty value. Go clients write nil slices and maps
/// as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference to another object by name within the same namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LocalObjectReference {
    /// Name of the referent.
    #[serde(default)]
    pub name: String,
}

impl LocalObjectReference {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// ============================================================================
// Cluster
// ============================================================================

/// `Cluster` describes a MySQL group replication cluster.
///
/// Omitted `version`, `replicas` and `baseServerId` are filled in by defaulting
/// before validation runs.
///
/// # Example
///
/// ```yaml
/// apiVersion: mysql.oracle.com/v1alpha1
/// kind: Cluster
/// metadata:
///   name: mycluster
///   namespace: mysql
/// spec:
///   replicas: 3
///   multiMaster: true
///   secretRef:
///     name: mysql-root-user-secret
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "mysql.oracle.com",
    version = "v1alpha1",
    kind = "Cluster",
    plural = "mysqlclusters",
    shortname = "mysqlcluster",
    namespaced,
    derive = "PartialEq",
    doc = "Cluster represents a MySQL InnoDB group replication cluster managed by the operator.",
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "ClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// MySQL server version. Must be one of the operator's supported versions.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Number of MySQL instances, between 1 and 9.
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    #[schemars(range(min = 0, max = 9))]
    pub replicas: i32,

    /// First `server_id` handed out; instance `n` gets `baseServerId + n`.
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub base_server_id: u32,

    /// Run group replication in multi-primary mode.
    #[serde(default, skip_serializing_if = "is_false")]
    pub multi_master: bool,

    /// Node labels the MySQL pods must be scheduled onto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    /// Pod affinity and anti-affinity rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,

    /// Claim template for the MySQL data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_claim_template: Option<PersistentVolumeClaim>,

    /// Claim template for the scratch space used while taking backups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_volume_claim_template: Option<PersistentVolumeClaim>,

    /// Secret holding the root password. Generated by the operator when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalObjectReference>,

    /// ConfigMap holding a `my.cnf` fragment mounted into every instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_ref: Option<LocalObjectReference>,

    /// Secret with `ca.crt`, `tls.crt` and `tls.key` for group replication SSL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_secret_ref: Option<LocalObjectReference>,
}

/// Lifecycle phase of a [`Cluster`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ClusterPhase {
    /// The state of the cluster could not be observed.
    #[default]
    #[serde(rename = "")]
    Unknown,
    /// Accepted, but not every component has started.
    Pending,
    /// All components are present and at least one endpoint accepts clients.
    Running,
    /// Every container terminated voluntarily with exit code 0.
    Succeeded,
    /// At least one container terminated in failure.
    Failed,
}

impl ClusterPhase {
    /// Every phase, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Unknown,
        Self::Pending,
        Self::Running,
        Self::Succeeded,
        Self::Failed,
    ];

    /// Wire representation; `Unknown` is the empty string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Observed state of a [`Cluster`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// Current lifecycle phase.
    #[serde(default)]
    pub phase: ClusterPhase,

    /// Errors reported by the reconciler.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub errors: Vec<String>,
}

impl Cluster {
    /// A root password secret must be generated when the user supplied none.
    #[must_use]
    pub fn requires_secret(&self) -> bool {
        self.spec.secret_ref.is_none()
    }

    /// The user supplied their own CA and certificates for group replication.
    #[must_use]
    pub fn requires_custom_ssl_setup(&self) -> bool {
        self.spec.ssl_secret_ref.is_some()
    }

    /// A user `my.cnf` ConfigMap has to be mounted.
    #[must_use]
    pub fn requires_config_mount(&self) -> bool {
        self.spec.config_ref.is_some()
    }

    #[must_use]
    pub fn is_multi_master(&self) -> bool {
        self.spec.multi_master
    }

    /// Server ids assigned to the instances, `baseServerId ..= baseServerId + replicas - 1`.
    ///
    /// Returns `None` when `replicas` is not positive or the range would not fit
    /// in the 32-bit server-id space.
    #[must_use]
    pub fn server_ids(&self) -> Option<RangeInclusive<u32>> {
        let replicas = u32::try_from(self.spec.replicas).ok().filter(|r| *r > 0)?;
        let last = self.spec.base_server_id.checked_add(replicas - 1)?;
        Some(self.spec.base_server_id..=last)
    }

    /// Server id of the instance with the given ordinal, if that ordinal exists.
    #[must_use]
    pub fn server_id_for(&self, ordinal: u32) -> Option<u32> {
        let replicas = u32::try_from(self.spec.replicas).ok()?;
        if ordinal >= replicas {
            return None;
        }
        self.spec.base_server_id.checked_add(ordinal)
    }

    /// Name of the secret holding the root password.
    #[must_use]
    pub fn root_password_secret_name(&self) -> String {
        match &self.spec.secret_ref {
            Some(secret) => secret.name.clone(),
            None => format!("{}-{ROOT_PASSWORD_SECRET_SUFFIX}", self.name_any()),
        }
    }

    /// Name of the secret holding the group replication SSL material.
    #[must_use]
    pub fn ssl_secret_name(&self) -> String {
        match &self.spec.ssl_secret_ref {
            Some(secret) => secret.name.clone(),
            None => format!("{}-{SSL_SECRET_SUFFIX}", self.name_any()),
        }
    }

    /// Current phase, `Unknown` when no status has been written.
    #[must_use]
    pub fn phase(&self) -> ClusterPhase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }
}

// ============================================================================
// Backup
// ============================================================================

/// Tool that produces a backup and what it should back up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BackupExecutor {
    /// Executor name, e.g. `mysqldump`.
    #[serde(default)]
    pub name: String,

    /// Databases to back up.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub databases: Vec<String>,
}

/// Where a backup is uploaded and how to authenticate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupStorageProvider {
    /// Provider name, e.g. `s3`.
    #[serde(default)]
    pub name: String,

    /// Secret holding the provider credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalObjectReference>,

    /// Provider-specific settings such as endpoint, region or bucket.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub config: BTreeMap<String, String>,
}

/// `Backup` is a one-off backup of a [`Cluster`].
///
/// # Example
///
/// ```yaml
/// apiVersion: mysql.oracle.com/v1alpha1
/// kind: Backup
/// metadata:
///   name: mysql-backup
/// spec:
///   executor:
///     name: mysqldump
///     databases: [test]
///   storageProvider:
///     name: s3
///     secretRef:
///       name: s3-credentials
///     config:
///       endpoint: s3.amazonaws.com
///       bucket: mysql-backups
///   cluster:
///     name: mycluster
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "mysql.oracle.com",
    version = "v1alpha1",
    kind = "Backup",
    plural = "mysqlbackups",
    shortname = "mysqlbackup",
    namespaced,
    derive = "PartialEq",
    doc = "Backup represents a single backup of a MySQL Cluster uploaded to object storage.",
    printcolumn = r#"{"name":"Cluster","type":"string","jsonPath":".spec.cluster.name"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "BackupStatus")]
#[serde(rename_all = "camelCase")]
pub struct BackupSpec {
    /// Tool that produces the backup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<BackupExecutor>,

    /// Destination of the backup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_provider: Option<BackupStorageProvider>,

    /// Cluster to back up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<LocalObjectReference>,

    /// Host the backup agent was scheduled on. Written by the reconciler.
    #[serde(
        default,
        rename = "agentscheduled",
        skip_serializing_if = "String::is_empty"
    )]
    pub agent_scheduled: String,
}

/// Lifecycle phase of a [`Backup`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BackupPhase {
    /// Not yet processed; equivalent to `New`.
    #[default]
    #[serde(rename = "")]
    Unknown,
    /// Not yet processed.
    New,
    /// Scheduled on a suitable replica.
    Scheduled,
    /// In progress.
    Started,
    /// Finished successfully.
    Complete,
    /// Finished with an error.
    Failed,
}

impl BackupPhase {
    pub const ALL: [Self; 6] = [
        Self::Unknown,
        Self::New,
        Self::Scheduled,
        Self::Started,
        Self::Complete,
        Self::Failed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::New => "New",
            Self::Scheduled => "Scheduled",
            Self::Started => "Started",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for BackupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Result of a finished backup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BackupOutcome {
    /// Object storage location of the backup archive.
    #[serde(default)]
    pub location: String,
}

/// Observed state of a [`Backup`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    #[serde(default)]
    pub phase: BackupPhase,

    /// Only meaningful once the phase is `Complete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<BackupOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_started: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_completed: Option<DateTime<Utc>>,
}

impl Backup {
    /// Name of the cluster being backed up.
    #[must_use]
    pub fn cluster_name(&self) -> Option<&str> {
        self.spec.cluster.as_ref().map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn phase(&self) -> BackupPhase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }

    /// Storage location of a completed backup.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        let status = self.status.as_ref()?;
        if status.phase != BackupPhase::Complete {
            return None;
        }
        status
            .outcome
            .as_ref()
            .map(|o| o.location.as_str())
            .filter(|l| !l.is_empty())
    }
}

// ============================================================================
// BackupSchedule
// ============================================================================

/// `BackupSchedule` creates a [`Backup`] from its template every time the cron
/// schedule fires.
///
/// # Example
///
/// ```yaml
/// apiVersion: mysql.oracle.com/v1alpha1
/// kind: BackupSchedule
/// metadata:
///   name: nightly
/// spec:
///   schedule: "30 2 * * *"
///   backupTemplate:
///     executor:
///       name: mysqldump
///       databases: [test]
///     storageProvider:
///       name: s3
///     cluster:
///       name: mycluster
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "mysql.oracle.com",
    version = "v1alpha1",
    kind = "BackupSchedule",
    plural = "mysqlbackupschedules",
    shortname = "mysqlbackupschedule",
    namespaced,
    derive = "PartialEq",
    doc = "BackupSchedule periodically creates Backups of a MySQL Cluster according to a cron schedule.",
    printcolumn = r#"{"name":"Schedule","type":"string","jsonPath":".spec.schedule"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Last Backup","type":"date","jsonPath":".status.lastBackup"}"#
)]
#[kube(status = "ScheduleStatus")]
#[serde(rename_all = "camelCase")]
pub struct BackupScheduleSpec {
    /// Five-field cron expression or a descriptor such as `@daily`.
    #[serde(default)]
    pub schedule: String,

    /// Spec of the backups this schedule creates.
    #[serde(default)]
    pub backup_template: BackupSpec,
}

/// Lifecycle phase of a [`BackupSchedule`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BackupSchedulePhase {
    /// Not yet processed; equivalent to `New`.
    #[default]
    #[serde(rename = "")]
    Unknown,
    /// Created or edited, waiting for validation.
    New,
    /// Validated and triggering backups.
    Enabled,
    /// Rejected by validation; stays here until the spec is edited.
    FailedValidation,
}

impl BackupSchedulePhase {
    pub const ALL: [Self; 4] = [
        Self::Unknown,
        Self::New,
        Self::Enabled,
        Self::FailedValidation,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::New => "New",
            Self::Enabled => "Enabled",
            Self::FailedValidation => "FailedValidation",
        }
    }
}

impl fmt::Display for BackupSchedulePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Observed state of a [`BackupSchedule`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatus {
    #[serde(default)]
    pub phase: BackupSchedulePhase,

    /// When this schedule last created a backup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_backup: Option<DateTime<Utc>>,

    /// `metadata.generation` the phase was decided on. Leaving `Enabled` or
    /// `FailedValidation` requires a newer generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

// ============================================================================
// Restore
// ============================================================================

/// `Restore` loads a completed [`Backup`] into a [`Cluster`].
///
/// # Example
///
/// ```yaml
/// apiVersion: mysql.oracle.com/v1alpha1
/// kind: Restore
/// metadata:
///   name: restore-1
/// spec:
///   clusterRef:
///     name: mycluster
///   backupRef:
///     name: mysql-backup
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "mysql.oracle.com",
    version = "v1alpha1",
    kind = "Restore",
    plural = "mysqlrestores",
    shortname = "mysqlrestore",
    namespaced,
    derive = "PartialEq",
    doc = "Restore restores a completed Backup into a MySQL Cluster.",
    printcolumn = r#"{"name":"Cluster","type":"string","jsonPath":".spec.clusterRef.name"}"#,
    printcolumn = r#"{"name":"Backup","type":"string","jsonPath":".spec.backupRef.name"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#
)]
#[kube(status = "RestoreStatus")]
#[serde(rename_all = "camelCase")]
pub struct RestoreSpec {
    /// Cluster to restore into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_ref: Option<LocalObjectReference>,

    /// Backup to restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_ref: Option<LocalObjectReference>,

    /// Host the restore agent was scheduled on. Written by the reconciler.
    #[serde(
        default,
        rename = "agentscheduled",
        skip_serializing_if = "String::is_empty"
    )]
    pub agent_scheduled: String,
}

/// Lifecycle phase of a [`Restore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum RestorePhase {
    /// Not yet processed; equivalent to `New`.
    #[default]
    #[serde(rename = "")]
    Unknown,
    New,
    Scheduled,
    Started,
    Complete,
    Failed,
}

impl RestorePhase {
    pub const ALL: [Self; 6] = [
        Self::Unknown,
        Self::New,
        Self::Scheduled,
        Self::Started,
        Self::Complete,
        Self::Failed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::New => "New",
            Self::Scheduled => "Scheduled",
            Self::Started => "Started",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Observed state of a [`Restore`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreStatus {
    #[serde(default)]
    pub phase: RestorePhase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_started: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_completed: Option<DateTime<Utc>>,
}

impl Restore {
    #[must_use]
    pub fn cluster_name(&self) -> Option<&str> {
        self.spec.cluster_ref.as_ref().map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn backup_name(&self) -> Option<&str> {
        self.spec.backup_ref.as_ref().map(|b| b.name.as_str())
    }

    #[must_use]
    pub fn phase(&self) -> RestorePhase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }

    /// A restore is in flight once it has been scheduled and until it finishes.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self.phase(), RestorePhase::Scheduled | RestorePhase::Started)
    }
}

/// Restores currently in flight against `cluster`.
///
/// The reconciler must not schedule another restore while this is non-empty.
#[must_use]
pub fn restores_in_flight_for<'a>(cluster: &str, restores: &'a [Restore]) -> Vec<&'a Restore> {
    restores
        .iter()
        .filter(|r| r.cluster_name() == Some(cluster) && r.is_in_flight())
        .collect()
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
