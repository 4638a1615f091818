// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants and helpers shared by all MySQL operator resources.
//!
//! The operator stamps its build version onto every `Backup`, `BackupSchedule`
//! and `Restore` it defaults, and ties child objects back to their `Cluster`
//! through the cluster label.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::{Expression, Selector};
use std::collections::BTreeMap;

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value for `app.kubernetes.io/managed-by` on objects the operator creates
pub const MANAGED_BY_MYSQL_OPERATOR: &str = "mysql-operator";

// ============================================================================
// Operator Labels
// ============================================================================

/// Label recording the operator build version that last defaulted a resource
pub const MYSQL_OPERATOR_VERSION_LABEL: &str = "v1alpha1.mysql.oracle.com/version";

/// Label naming the `Cluster` a resource belongs to
pub const CLUSTER_LABEL: &str = "v1alpha1.mysql.oracle.com/cluster";

/// Label naming the `BackupSchedule` that stamped out a `Backup`
pub const BACKUP_SCHEDULE_LABEL: &str = "v1alpha1.mysql.oracle.com/backupschedule";

/// Set the operator version label, overwriting any existing value.
pub fn set_operator_version_label(labels: &mut BTreeMap<String, String>, version: &str) {
    labels.insert(MYSQL_OPERATOR_VERSION_LABEL.to_string(), version.to_string());
}

/// Operator version recorded on an object, if any.
#[must_use]
pub fn operator_version(metadata: &ObjectMeta) -> Option<&str> {
    metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(MYSQL_OPERATOR_VERSION_LABEL))
        .map(String::as_str)
}

/// Stamp `build_version` onto `metadata` unless the label is already present.
///
/// The labels map is allocated only when a write is going to happen. Returns
/// `true` when the label was added.
pub fn ensure_operator_version_label(metadata: &mut ObjectMeta, build_version: Option<&str>) -> bool {
    let Some(version) = build_version.filter(|v| !v.is_empty()) else {
        return false;
    };

    let labels = metadata.labels.get_or_insert_with(BTreeMap::new);
    if labels.contains_key(MYSQL_OPERATOR_VERSION_LABEL) {
        return false;
    }

    set_operator_version_label(labels, version);
    true
}

/// Selector for the objects labelled as belonging to `cluster`.
#[must_use]
pub fn cluster_selector(cluster: &str) -> Selector {
    Expression::Equal(CLUSTER_LABEL.to_string(), cluster.to_string()).into()
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod labels_tests;
