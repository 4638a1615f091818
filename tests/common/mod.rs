// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{
    api::{Api, DeleteParams, PostParams},
    client::Client,
};
use mysql_operator::crd::{
    Backup, BackupExecutor, BackupSpec, BackupStorageProvider, Cluster, ClusterSpec,
    LocalObjectReference, Restore, RestoreSpec,
};
use mysql_operator::labels::CLUSTER_LABEL;
use std::collections::BTreeMap;

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let mut labels = BTreeMap::new();
    labels.insert("test".to_string(), "integration".to_string());
    labels.insert("managed-by".to_string(), "mysql-operator-test".to_string());

    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        ..Default::default()
    };

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => {
            println!("Created test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            println!("Test namespace already exists: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Cleanup test namespace
pub async fn cleanup_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            println!("Deleted test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            println!("Test namespace already deleted: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// A three-member multi-primary cluster with everything else left to defaulting
pub fn sample_cluster(name: &str) -> Cluster {
    Cluster::new(
        name,
        ClusterSpec {
            replicas: 3,
            multi_master: true,
            ..Default::default()
        },
    )
}

/// A valid mysqldump-to-s3 backup of `cluster`, labelled with the cluster name
pub fn sample_backup(name: &str, cluster: &str) -> Backup {
    let mut backup = Backup::new(
        name,
        BackupSpec {
            executor: Some(BackupExecutor {
                name: "mysqldump".to_string(),
                databases: vec!["test".to_string()],
            }),
            storage_provider: Some(BackupStorageProvider {
                name: "s3".to_string(),
                secret_ref: Some(LocalObjectReference::new("s3-credentials")),
                config: BTreeMap::from([
                    ("endpoint".to_string(), "s3.amazonaws.com".to_string()),
                    ("bucket".to_string(), "mysql-backups".to_string()),
                ]),
            }),
            cluster: Some(LocalObjectReference::new(cluster)),
            ..Default::default()
        },
    );
    backup.metadata.labels = Some(BTreeMap::from([(
        CLUSTER_LABEL.to_string(),
        cluster.to_string(),
    )]));
    backup
}

/// A restore of `backup` into `cluster`
pub fn sample_restore(name: &str, cluster: &str, backup: &str) -> Restore {
    Restore::new(
        name,
        RestoreSpec {
            cluster_ref: Some(LocalObjectReference::new(cluster)),
            backup_ref: Some(LocalObjectReference::new(backup)),
            ..Default::default()
        },
    )
}
