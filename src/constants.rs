// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the MySQL operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all MySQL operator CRDs
pub const API_GROUP: &str = "mysql.oracle.com";

/// API version for all MySQL operator CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Kind name for `Cluster` resource
pub const KIND_CLUSTER: &str = "Cluster";

/// Kind name for `Backup` resource
pub const KIND_BACKUP: &str = "Backup";

/// Kind name for `BackupSchedule` resource
pub const KIND_BACKUP_SCHEDULE: &str = "BackupSchedule";

/// Kind name for `Restore` resource
pub const KIND_RESTORE: &str = "Restore";

// ============================================================================
// Cluster Topology Constants
// ============================================================================

/// Maximum number of members supported by InnoDB group replication.
pub const MAX_INNODB_CLUSTER_MEMBERS: i32 = 9;

/// Maximum supported length of a `Cluster` name.
///
/// The name ends up in the group replication channel name, which MySQL
/// truncates (see <https://bugs.mysql.com/bug.php?id=90601>).
pub const CLUSTER_NAME_MAX_LEN: usize = 28;

/// Length of the random suffix the API server appends to `generateName`.
pub const GENERATE_NAME_SUFFIX_LEN: usize = 5;

/// Largest `server_id` MySQL accepts.
pub const MAX_MYSQL_SERVER_ID: u32 = u32::MAX;

/// Largest safe `baseServerId`: the server-id space minus the largest group.
pub const MAX_BASE_SERVER_ID: u32 = MAX_MYSQL_SERVER_ID - MAX_INNODB_CLUSTER_MEMBERS as u32;

// ============================================================================
// Defaulting Constants
// ============================================================================

/// MySQL version used when the user does not set one
pub const DEFAULT_MYSQL_VERSION: &str = "8.0.11";

/// Replica count used when the user does not set one
pub const DEFAULT_REPLICAS: i32 = 1;

/// Base server id used when the user does not set one
pub const DEFAULT_BASE_SERVER_ID: u32 = 1000;

/// Backup tool enabled out of the box
pub const DEFAULT_BACKUP_EXECUTOR: &str = "mysqldump";

/// Storage provider enabled out of the box
pub const DEFAULT_STORAGE_PROVIDER: &str = "s3";

// ============================================================================
// Secret Constants
// ============================================================================

/// Suffix of the operator-generated root password secret
pub const ROOT_PASSWORD_SECRET_SUFFIX: &str = "root-password";

/// Suffix of the operator-generated group replication SSL secret
pub const SSL_SECRET_SUFFIX: &str = "ssl";

// ============================================================================
// Configuration Constants
// ============================================================================

/// Environment variable pointing at the operator configuration file
pub const CONFIG_PATH_ENV: &str = "MYSQL_OPERATOR_CONFIG";

/// Environment variable overriding the supported MySQL versions (comma separated)
pub const SUPPORTED_VERSIONS_ENV: &str = "MYSQL_OPERATOR_SUPPORTED_VERSIONS";

// ============================================================================
// Webhook Server Constants
// ============================================================================

/// Default HTTPS port for the admission webhook
pub const WEBHOOK_SERVER_PORT: u16 = 8443;

/// Default bind address for the admission webhook
pub const WEBHOOK_SERVER_BIND_ADDRESS: &str = "0.0.0.0";

/// Path of the mutating (defaulting) webhook
pub const WEBHOOK_MUTATE_PATH: &str = "/mutate";

/// Path of the validating webhook
pub const WEBHOOK_VALIDATE_PATH: &str = "/validate";

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness endpoint
pub const HEALTH_PATH: &str = "/healthz";

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;
