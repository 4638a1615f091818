// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Integration tests for the client façade against a real API server
//!
//! The CRDs from deploy/crds/ must be installed first:
//!
//!   cargo run --bin crdgen && kubectl apply -f deploy/crds/
//!
//! Run with: cargo test --test simple_integration -- --ignored

mod common;

use common::{
    cleanup_test_namespace, create_test_namespace, get_kube_client_or_skip, sample_backup,
    sample_cluster, sample_restore,
};
use futures::StreamExt;
use kube::core::Selector;
use kube::ResourceExt;
use mysql_operator::client::{KubeResourceClient, ResourceClient, ResourceEvent};
use mysql_operator::crd::{
    Backup, BackupPhase, BackupStatus, Cluster, ClusterSpec, Restore,
};
use mysql_operator::errors::ClientError;
use mysql_operator::labels::cluster_selector;

#[tokio::test]
#[ignore = "requires a Kubernetes cluster with the CRDs installed"]
async fn test_cluster_create_get_delete() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    let namespace = "mysql-operator-it-cluster";
    create_test_namespace(&client, namespace).await.unwrap();

    let clusters: KubeResourceClient<Cluster> = KubeResourceClient::new(client.clone(), namespace);
    let created = clusters.create(sample_cluster("mycluster")).await.unwrap();
    assert_eq!(created.spec.base_server_id, 1000);
    assert_eq!(created.spec.version, "8.0.11");

    let fetched = clusters.get("mycluster").await.unwrap();
    assert_eq!(fetched.spec, created.spec);

    let duplicate = clusters.create(sample_cluster("mycluster")).await.unwrap_err();
    assert!(duplicate.is_conflict());

    clusters.delete("mycluster").await.unwrap();
    assert!(clusters.get("mycluster").await.unwrap_err().is_not_found());

    cleanup_test_namespace(&client, namespace).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster with the CRDs installed"]
async fn test_invalid_cluster_is_never_sent() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    let namespace = "mysql-operator-it-invalid";
    create_test_namespace(&client, namespace).await.unwrap();

    let clusters: KubeResourceClient<Cluster> = KubeResourceClient::new(client.clone(), namespace);
    let invalid = Cluster::new(
        "much-too-long-a-name-for-a-mysql-cluster",
        ClusterSpec {
            replicas: 12,
            ..Default::default()
        },
    );
    let err = clusters.create(invalid).await.unwrap_err();
    let ClientError::Validation(errs) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errs.contains_field("metadata.name"));
    assert!(errs.contains_field("spec.replicas"));

    cleanup_test_namespace(&client, namespace).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster with the CRDs installed"]
async fn test_backup_status_lifecycle() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    let namespace = "mysql-operator-it-backup";
    create_test_namespace(&client, namespace).await.unwrap();

    let backups: KubeResourceClient<Backup> = KubeResourceClient::new(client.clone(), namespace);
    let mut current = backups
        .create(sample_backup("mysql-backup", "mycluster"))
        .await
        .unwrap();

    for phase in [
        BackupPhase::Scheduled,
        BackupPhase::Started,
        BackupPhase::Complete,
    ] {
        current.status = Some(BackupStatus {
            phase,
            ..Default::default()
        });
        current = backups.update_status(current).await.unwrap();
        assert_eq!(current.phase(), phase);
    }

    current.status = Some(BackupStatus {
        phase: BackupPhase::Started,
        ..Default::default()
    });
    let err = backups.update_status(current).await.unwrap_err();
    assert!(matches!(err, ClientError::IllegalTransition(_)));

    cleanup_test_namespace(&client, namespace).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster with the CRDs installed"]
async fn test_stale_update_conflicts() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    let namespace = "mysql-operator-it-conflict";
    create_test_namespace(&client, namespace).await.unwrap();

    let restores: KubeResourceClient<Restore> = KubeResourceClient::new(client.clone(), namespace);
    let created = restores
        .create(sample_restore("restore-1", "mycluster", "mysql-backup"))
        .await
        .unwrap();

    let mut first = created.clone();
    first.spec.agent_scheduled = "mycluster-0".to_string();
    restores.update(first).await.unwrap();

    let mut stale = created;
    stale.spec.agent_scheduled = "mycluster-1".to_string();
    assert!(restores.update(stale).await.unwrap_err().is_conflict());

    cleanup_test_namespace(&client, namespace).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster with the CRDs installed"]
async fn test_list_watch_and_delete_collection_by_cluster_label() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    let namespace = "mysql-operator-it-select";
    create_test_namespace(&client, namespace).await.unwrap();

    let backups: KubeResourceClient<Backup> = KubeResourceClient::new(client.clone(), namespace);
    let selector = cluster_selector("alpha");
    let mut events = backups.watch(&selector).await.unwrap();

    backups.create(sample_backup("a1", "alpha")).await.unwrap();
    backups.create(sample_backup("b1", "beta")).await.unwrap();

    let event = events.next().await.unwrap().unwrap();
    assert!(matches!(&event, ResourceEvent::Added(b) if b.name_any() == "a1"));

    let alpha = backups.list(&selector).await.unwrap();
    assert_eq!(alpha.len(), 1);

    backups
        .patch("a1", br#"{"metadata":{"labels":{"team":"dba"}}}"#)
        .await
        .unwrap();
    let patched = backups.get("a1").await.unwrap();
    assert_eq!(patched.labels().get("team").map(String::as_str), Some("dba"));

    backups.delete_collection(&selector).await.unwrap();
    let remaining = backups.list(&Selector::default()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name_any(), "b1");

    cleanup_test_namespace(&client, namespace).await.unwrap();
}
