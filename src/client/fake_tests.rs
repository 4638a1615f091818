// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use crate::client::fake::FakeClient;
    use crate::client::{ResourceClient, ResourceEvent};
    use crate::crd::*;
    use crate::errors::{ClientError, TransitionError};
    use crate::lifecycle::HasPhase;
    use crate::labels::{cluster_selector, CLUSTER_LABEL};
    use futures::StreamExt;
    use kube::core::{Expression, Selector};
    use kube::ResourceExt;
    use std::collections::{BTreeMap, BTreeSet};

    fn backup(name: &str, cluster: &str) -> Backup {
        let mut backup = Backup::new(
            name,
            BackupSpec {
                executor: Some(BackupExecutor {
                    name: "mysqldump".to_string(),
                    databases: vec!["test".to_string()],
                }),
                storage_provider: Some(BackupStorageProvider {
                    name: "s3".to_string(),
                    ..Default::default()
                }),
                cluster: Some(LocalObjectReference::new(cluster)),
                ..Default::default()
            },
        );
        backup
            .labels_mut()
            .insert(CLUSTER_LABEL.to_string(), cluster.to_string());
        backup
    }

    fn with_phase(mut backup: Backup, phase: BackupPhase) -> Backup {
        backup.status.get_or_insert_with(BackupStatus::default).phase = phase;
        backup
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let clusters: FakeClient<Cluster> = FakeClient::new("mysql");
        let created = clusters
            .create(Cluster::new("mycluster", ClusterSpec::default()))
            .await
            .unwrap();

        assert_eq!(created.spec.replicas, 1);
        assert_eq!(created.spec.base_server_id, 1000);
        assert_eq!(created.spec.version, "8.0.11");
        assert_eq!(created.namespace().as_deref(), Some("mysql"));
        assert!(created.resource_version().is_some());

        let fetched = clusters.get("mycluster").await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_object() {
        let clusters: FakeClient<Cluster> = FakeClient::new("mysql");
        let spec = ClusterSpec {
            replicas: 10,
            version: "5.7.0".to_string(),
            ..Default::default()
        };

        let err = clusters
            .create(Cluster::new("mycluster", spec))
            .await
            .unwrap_err();
        let ClientError::Validation(errs) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errs.len(), 2);
        assert!(errs.contains_field("spec.replicas"));
        assert!(errs.contains_field("spec.version"));
        assert!(clusters.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_existing_name_conflicts() {
        let backups: FakeClient<Backup> = FakeClient::new("mysql");
        backups.create(backup("b1", "mycluster")).await.unwrap();

        let err = backups.create(backup("b1", "mycluster")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_create_with_generate_name() {
        let backups: FakeClient<Backup> = FakeClient::new("mysql");
        let mut template = backup("ignored", "mycluster");
        template.metadata.name = None;
        template.metadata.generate_name = Some("nightly-".to_string());

        let first = backups.create(template.clone()).await.unwrap();
        let second = backups.create(template).await.unwrap();

        assert!(first.name_any().starts_with("nightly-"));
        assert_ne!(first.name_any(), second.name_any());
        assert_eq!(backups.len().await, 2);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let restores: FakeClient<Restore> = FakeClient::new("mysql");
        let err = restores.get("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let backups: FakeClient<Backup> = FakeClient::new("mysql");
        let created = backups.create(backup("b1", "mycluster")).await.unwrap();

        let mut first = created.clone();
        first.spec.agent_scheduled = "node-a".to_string();
        let updated = backups.update(first).await.unwrap();
        assert_ne!(updated.resource_version(), created.resource_version());

        let mut stale = created;
        stale.spec.agent_scheduled = "node-b".to_string();
        let err = backups.update(stale).await.unwrap_err();
        assert!(err.is_conflict());

        let stored = backups.get("b1").await.unwrap();
        assert_eq!(stored.spec.agent_scheduled, "node-a");
    }

    #[tokio::test]
    async fn test_update_does_not_touch_status() {
        let backups: FakeClient<Backup> = FakeClient::new("mysql");
        let created = backups.create(backup("b1", "mycluster")).await.unwrap();
        let scheduled = backups
            .update_status(with_phase(created, BackupPhase::Scheduled))
            .await
            .unwrap();

        let sneaky = with_phase(scheduled, BackupPhase::Complete);
        let updated = backups.update(sneaky).await.unwrap();
        assert_eq!(updated.phase(), BackupPhase::Scheduled);
    }

    #[tokio::test]
    async fn test_update_status_follows_lifecycle() {
        let backups: FakeClient<Backup> = FakeClient::new("mysql");
        let mut current = backups.create(backup("b1", "mycluster")).await.unwrap();

        for phase in [
            BackupPhase::Scheduled,
            BackupPhase::Started,
            BackupPhase::Complete,
        ] {
            current = backups
                .update_status(with_phase(current, phase))
                .await
                .unwrap();
            assert_eq!(current.phase(), phase);
        }

        let err = backups
            .update_status(with_phase(current, BackupPhase::Started))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::IllegalTransition(_)));
        assert_eq!(
            backups.get("b1").await.unwrap().phase(),
            BackupPhase::Complete
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_selector() {
        let backups: FakeClient<Backup> = FakeClient::new("mysql");
        backups.create(backup("a1", "alpha")).await.unwrap();
        backups.create(backup("a2", "alpha")).await.unwrap();
        backups.create(backup("b1", "beta")).await.unwrap();

        let names: Vec<String> = backups
            .list(&cluster_selector("alpha"))
            .await
            .unwrap()
            .iter()
            .map(ResourceExt::name_any)
            .collect();
        assert_eq!(names, vec!["a1", "a2"]);

        let all = backups.list(&Selector::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_watch_streams_changes() {
        let backups: FakeClient<Backup> = FakeClient::new("mysql");
        backups.create(backup("existing", "alpha")).await.unwrap();

        let mut events = backups.watch(&cluster_selector("alpha")).await.unwrap();

        let first = events.next().await.unwrap().unwrap();
        assert!(matches!(&first, ResourceEvent::Added(b) if b.name_any() == "existing"));

        backups.create(backup("other", "beta")).await.unwrap();
        let created = backups.create(backup("fresh", "alpha")).await.unwrap();
        let added = events.next().await.unwrap().unwrap();
        assert!(matches!(&added, ResourceEvent::Added(b) if b.name_any() == "fresh"));

        backups
            .update_status(with_phase(created, BackupPhase::Scheduled))
            .await
            .unwrap();
        let modified = events.next().await.unwrap().unwrap();
        assert!(matches!(&modified, ResourceEvent::Modified(_)));
        assert_eq!(modified.object().phase(), BackupPhase::Scheduled);

        backups.delete("fresh").await.unwrap();
        let deleted = events.next().await.unwrap().unwrap();
        assert!(matches!(deleted, ResourceEvent::Deleted(_)));
    }

    #[tokio::test]
    async fn test_delete_and_delete_collection() {
        let backups: FakeClient<Backup> = FakeClient::new("mysql");
        backups.create(backup("a1", "alpha")).await.unwrap();
        backups.create(backup("a2", "alpha")).await.unwrap();
        backups.create(backup("b1", "beta")).await.unwrap();

        backups.delete("b1").await.unwrap();
        assert!(backups.delete("b1").await.unwrap_err().is_not_found());

        let selector: Selector =
            Expression::In(CLUSTER_LABEL.to_string(), BTreeSet::from(["alpha".to_string()])).into();
        backups.delete_collection(&selector).await.unwrap();
        assert!(backups.is_empty().await);
    }

    #[tokio::test]
    async fn test_patch_merges_spec_and_keeps_status() {
        let restores: FakeClient<Restore> = FakeClient::new("mysql");
        let mut restore = Restore::new(
            "r1",
            RestoreSpec {
                cluster_ref: Some(LocalObjectReference::new("mycluster")),
                backup_ref: Some(LocalObjectReference::new("b1")),
                ..Default::default()
            },
        );
        restore.status = Some(RestoreStatus {
            phase: RestorePhase::Scheduled,
            ..Default::default()
        });
        let seeded = restores.seed(restore).await.unwrap();

        let patch = br#"{"metadata":{"labels":{"team":"dba"}},"spec":{"agentscheduled":"node-a"},"status":{"phase":"Complete"}}"#;
        let patched = restores.patch("r1", patch).await.unwrap();

        assert_eq!(patched.spec.agent_scheduled, "node-a");
        assert_eq!(patched.spec.backup_ref, seeded.spec.backup_ref);
        assert_eq!(patched.labels().get("team").map(String::as_str), Some("dba"));
        assert_eq!(patched.phase(), RestorePhase::Scheduled);
        assert_ne!(patched.resource_version(), seeded.resource_version());
    }

    #[tokio::test]
    async fn test_patch_errors() {
        let restores: FakeClient<Restore> = FakeClient::new("mysql");
        let err = restores.patch("missing", b"{}").await.unwrap_err();
        assert!(err.is_not_found());

        restores
            .seed(Restore::new("r1", RestoreSpec::default()))
            .await
            .unwrap();
        let err = restores.patch("r1", b"not json").await.unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let writer: FakeClient<Restore> = FakeClient::new("mysql");
        let reader = writer.clone();

        let mut labels = BTreeMap::new();
        labels.insert("k".to_string(), "v".to_string());
        let mut restore = Restore::new("r1", RestoreSpec::default());
        restore.metadata.labels = Some(labels.clone());
        writer.seed(restore).await.unwrap();

        let found = reader
            .list(&labels.clone().into_iter().collect::<Selector>())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(reader.namespace(), "mysql");
    }

    fn schedule(expr: &str) -> BackupSchedule {
        let mut template = backup("ignored", "mycluster").spec;
        if let Some(provider) = template.storage_provider.as_mut() {
            provider.secret_ref = Some(LocalObjectReference::new("s3-credentials"));
        }
        BackupSchedule::new(
            "nightly",
            BackupScheduleSpec {
                schedule: expr.to_string(),
                backup_template: template,
            },
        )
    }

    fn with_schedule_phase(mut schedule: BackupSchedule, phase: BackupSchedulePhase) -> BackupSchedule {
        schedule.status.get_or_insert_with(ScheduleStatus::default).phase = phase;
        schedule
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_object() {
        let clusters: FakeClient<Cluster> = FakeClient::new("mysql");
        let created = clusters
            .create(Cluster::new("mycluster", ClusterSpec::default()))
            .await
            .unwrap();

        let mut invalid = created.clone();
        invalid.spec.replicas = 42;
        invalid.spec.version = "5.0.0".to_string();
        let err = clusters.update(invalid).await.unwrap_err();
        let ClientError::Validation(errs) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errs.contains_field("spec.replicas"));
        assert!(errs.contains_field("spec.version"));

        assert_eq!(clusters.get("mycluster").await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_applies_defaults() {
        let clusters: FakeClient<Cluster> = FakeClient::new("mysql");
        let created = clusters
            .create(Cluster::new("mycluster", ClusterSpec::default()))
            .await
            .unwrap();

        let mut cleared = created;
        cleared.spec.version = String::new();
        cleared.spec.base_server_id = 0;
        let updated = clusters.update(cleared).await.unwrap();
        assert_eq!(updated.spec.version, "8.0.11");
        assert_eq!(updated.spec.base_server_id, 1000);
    }

    #[tokio::test]
    async fn test_patch_rejects_invalid_merged_object() {
        let clusters: FakeClient<Cluster> = FakeClient::new("mysql");
        let created = clusters
            .create(Cluster::new("mycluster", ClusterSpec::default()))
            .await
            .unwrap();

        let err = clusters
            .patch("mycluster", br#"{"spec":{"replicas":42}}"#)
            .await
            .unwrap_err();
        let ClientError::Validation(errs) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errs.contains_field("spec.replicas"));
        assert_eq!(clusters.get("mycluster").await.unwrap(), created);

        let schedules: FakeClient<BackupSchedule> = FakeClient::new("mysql");
        schedules.create(schedule("@daily")).await.unwrap();
        let err = schedules
            .patch("nightly", br#"{"spec":{"schedule":"not a cron"}}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(schedules.get("nightly").await.unwrap().spec.schedule, "@daily");
    }

    #[tokio::test]
    async fn test_schedule_verdict_needs_spec_edit_to_reset() {
        let schedules: FakeClient<BackupSchedule> = FakeClient::new("mysql");
        let created = schedules.create(schedule("@daily")).await.unwrap();

        let failed = schedules
            .update_status(with_schedule_phase(created, BackupSchedulePhase::FailedValidation))
            .await
            .unwrap();
        assert_eq!(
            failed.status.as_ref().unwrap().observed_generation,
            failed.metadata.generation
        );

        let err = schedules
            .update_status(with_schedule_phase(failed.clone(), BackupSchedulePhase::New))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::IllegalTransition(_)));

        let mut edited = failed;
        edited.spec.schedule = "30 2 * * *".to_string();
        let edited = schedules.update(edited).await.unwrap();
        assert!(edited.edited_since_status());

        let reset = schedules
            .update_status(with_schedule_phase(edited, BackupSchedulePhase::New))
            .await
            .unwrap();
        assert_eq!(reset.current_phase(), BackupSchedulePhase::New);
    }

    #[tokio::test]
    async fn test_schedule_with_invalid_spec_cannot_be_enabled() {
        let schedules: FakeClient<BackupSchedule> = FakeClient::new("mysql");
        let seeded = schedules
            .seed(with_schedule_phase(schedule("every night"), BackupSchedulePhase::New))
            .await
            .unwrap();

        let err = schedules
            .update_status(with_schedule_phase(seeded.clone(), BackupSchedulePhase::Enabled))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::IllegalTransition(TransitionError::InvalidSpec { .. })
        ));

        let failed = schedules
            .update_status(with_schedule_phase(seeded, BackupSchedulePhase::FailedValidation))
            .await
            .unwrap();
        assert_eq!(failed.current_phase(), BackupSchedulePhase::FailedValidation);
    }
}
