// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use crate::config::OperatorConfig;
    use crate::crd::*;
    use crate::errors::TransitionError;
    use crate::lifecycle::*;

    #[test]
    fn test_same_phase_always_accepted() {
        for phase in ClusterPhase::ALL {
            assert!(phase.check_transition(phase).is_ok());
        }
        for phase in BackupPhase::ALL {
            assert!(phase.check_transition(phase).is_ok());
        }
        for phase in BackupSchedulePhase::ALL {
            assert!(phase.check_transition(phase).is_ok());
        }
        for phase in RestorePhase::ALL {
            assert!(phase.check_transition(phase).is_ok());
        }
    }

    #[test]
    fn test_cluster_forward_path() {
        assert!(ClusterPhase::Unknown.can_transition_to(ClusterPhase::Pending));
        assert!(ClusterPhase::Pending.can_transition_to(ClusterPhase::Running));
        assert!(ClusterPhase::Pending.can_transition_to(ClusterPhase::Failed));
        assert!(ClusterPhase::Running.can_transition_to(ClusterPhase::Succeeded));
        assert!(ClusterPhase::Running.can_transition_to(ClusterPhase::Failed));
    }

    #[test]
    fn test_cluster_unknown_reachable_from_anywhere() {
        for phase in ClusterPhase::ALL {
            assert!(phase.can_transition_to(ClusterPhase::Unknown), "{phase} -> Unknown");
        }
        assert!(ClusterPhase::Unknown.can_transition_to(ClusterPhase::Running));
    }

    #[test]
    fn test_cluster_backwards_rejected() {
        assert!(!ClusterPhase::Running.can_transition_to(ClusterPhase::Pending));
        assert!(!ClusterPhase::Succeeded.can_transition_to(ClusterPhase::Running));
        assert!(!ClusterPhase::Failed.can_transition_to(ClusterPhase::Succeeded));
        assert!(!ClusterPhase::Pending.can_transition_to(ClusterPhase::Succeeded));
        assert!(!ClusterPhase::Unknown.can_transition_to(ClusterPhase::Succeeded));
        assert!(ClusterPhase::Failed.is_terminal());
        assert!(!ClusterPhase::Running.is_terminal());
    }

    #[test]
    fn test_backup_complete_to_started_rejected() {
        let err = BackupPhase::Complete
            .check_transition(BackupPhase::Started)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal {
                kind: "Backup",
                from: "Complete".to_string(),
                to: "Started".to_string(),
            }
        );
    }

    #[test]
    fn test_backup_forward_path() {
        let path = [
            BackupPhase::Unknown,
            BackupPhase::New,
            BackupPhase::Scheduled,
            BackupPhase::Started,
            BackupPhase::Complete,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_backup_unknown_is_new() {
        assert!(BackupPhase::Unknown.can_transition_to(BackupPhase::Scheduled));
        assert!(BackupPhase::New.can_transition_to(BackupPhase::Unknown));
        assert!(!BackupPhase::Unknown.can_transition_to(BackupPhase::Complete));
    }

    #[test]
    fn test_backup_skipping_steps_rejected() {
        assert!(!BackupPhase::New.can_transition_to(BackupPhase::Started));
        assert!(!BackupPhase::Scheduled.can_transition_to(BackupPhase::Complete));
    }

    #[test]
    fn test_backup_any_non_terminal_may_fail() {
        for phase in [
            BackupPhase::Unknown,
            BackupPhase::New,
            BackupPhase::Scheduled,
            BackupPhase::Started,
        ] {
            assert!(phase.can_transition_to(BackupPhase::Failed));
            assert!(!phase.is_terminal());
        }
    }

    #[test]
    fn test_backup_terminal_phases_are_final() {
        for terminal in [BackupPhase::Complete, BackupPhase::Failed] {
            assert!(terminal.is_terminal());
            for next in BackupPhase::ALL {
                if next != terminal {
                    assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
                }
            }
        }
    }

    #[test]
    fn test_restore_mirrors_backup() {
        for from in RestorePhase::ALL {
            for to in RestorePhase::ALL {
                let backup_from = BackupPhase::ALL[RestorePhase::ALL
                    .iter()
                    .position(|p| *p == from)
                    .unwrap()];
                let backup_to = BackupPhase::ALL[RestorePhase::ALL
                    .iter()
                    .position(|p| *p == to)
                    .unwrap()];
                assert_eq!(
                    from.can_transition_to(to),
                    backup_from.can_transition_to(backup_to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_schedule_transitions() {
        use BackupSchedulePhase::*;

        assert!(Unknown.can_transition_to(New));
        assert!(New.can_transition_to(Enabled));
        assert!(New.can_transition_to(FailedValidation));

        // leaving a verdict needs a spec edit, which the bare machine cannot see
        assert!(!Enabled.can_transition_to(New));
        assert!(!FailedValidation.can_transition_to(New));
        assert!(!FailedValidation.can_transition_to(Enabled));
        assert!(!Enabled.can_transition_to(FailedValidation));
        assert!(!New.can_transition_to(Unknown));
        assert!(FailedValidation.is_terminal());
        assert!(!Enabled.is_terminal());
    }

    #[test]
    fn test_status_transition_to_writes_phase() {
        let mut status = BackupStatus::default();
        status.transition_to(BackupPhase::New).unwrap();
        status.transition_to(BackupPhase::Scheduled).unwrap();
        assert_eq!(status.phase, BackupPhase::Scheduled);
    }

    #[test]
    fn test_status_transition_to_leaves_phase_on_error() {
        let mut status = RestoreStatus {
            phase: RestorePhase::Failed,
            ..Default::default()
        };
        assert!(status.transition_to(RestorePhase::Started).is_err());
        assert_eq!(status.phase, RestorePhase::Failed);

        let mut status = ClusterStatus {
            phase: ClusterPhase::Running,
            ..Default::default()
        };
        assert!(status.transition_to(ClusterPhase::Pending).is_err());
        assert_eq!(status.phase, ClusterPhase::Running);

        let mut status = ScheduleStatus {
            phase: BackupSchedulePhase::FailedValidation,
            ..Default::default()
        };
        assert!(status.transition_to(BackupSchedulePhase::Enabled).is_err());
        assert!(status.transition_to(BackupSchedulePhase::New).is_err());
        assert_eq!(status.phase, BackupSchedulePhase::FailedValidation);
    }

    #[test]
    fn test_current_phase_defaults_without_status() {
        let backup = Backup::new("b", BackupSpec::default());
        assert_eq!(backup.current_phase(), BackupPhase::Unknown);

        let schedule = BackupSchedule::new("s", BackupScheduleSpec::default());
        assert_eq!(schedule.current_phase(), BackupSchedulePhase::Unknown);
    }

    #[test]
    fn test_illegal_transition_error_message() {
        let err = ClusterPhase::Succeeded
            .check_transition(ClusterPhase::Pending)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal Cluster phase transition from 'Succeeded' to 'Pending'"
        );
    }

    fn valid_schedule() -> BackupSchedule {
        BackupSchedule::new(
            "nightly",
            BackupScheduleSpec {
                schedule: "@daily".to_string(),
                backup_template: BackupSpec {
                    executor: Some(BackupExecutor {
                        name: "mysqldump".to_string(),
                        databases: vec!["test".to_string()],
                    }),
                    storage_provider: Some(BackupStorageProvider {
                        name: "s3".to_string(),
                        secret_ref: Some(LocalObjectReference::new("s3-credentials")),
                        ..Default::default()
                    }),
                    cluster: Some(LocalObjectReference::new("mycluster")),
                    agent_scheduled: String::new(),
                },
            },
        )
    }

    fn at(mut schedule: BackupSchedule, phase: BackupSchedulePhase, generation: i64) -> BackupSchedule {
        schedule.metadata.generation = Some(generation);
        schedule.status.get_or_insert_with(ScheduleStatus::default).phase = phase;
        schedule
    }

    #[test]
    fn test_schedule_verdict_kept_until_spec_edit() {
        let config = OperatorConfig::default();
        let mut stored = at(valid_schedule(), BackupSchedulePhase::FailedValidation, 2);
        stored.status.as_mut().unwrap().observed_generation = Some(2);
        let reset = at(stored.clone(), BackupSchedulePhase::New, 2);

        let err = stored.check_status_write(&reset, &config).unwrap_err();
        assert!(matches!(err, TransitionError::Illegal { .. }));
        assert!(!stored.edited_since_status());

        stored.metadata.generation = Some(3);
        assert!(stored.edited_since_status());
        assert!(stored.check_status_write(&reset, &config).is_ok());
    }

    #[test]
    fn test_schedule_enabled_resets_after_edit() {
        let config = OperatorConfig::default();
        let mut stored = at(valid_schedule(), BackupSchedulePhase::Enabled, 4);
        stored.status.as_mut().unwrap().observed_generation = Some(4);
        let reset = at(stored.clone(), BackupSchedulePhase::New, 4);
        assert!(stored.check_status_write(&reset, &config).is_err());

        stored.metadata.generation = Some(5);
        assert!(stored.check_status_write(&reset, &config).is_ok());
    }

    #[test]
    fn test_schedule_status_without_observed_generation_counts_as_edited() {
        let stored = at(valid_schedule(), BackupSchedulePhase::FailedValidation, 1);
        assert!(stored.edited_since_status());
    }

    #[test]
    fn test_schedule_cannot_be_enabled_with_invalid_spec() {
        let config = OperatorConfig::default();
        let mut stored = at(valid_schedule(), BackupSchedulePhase::New, 1);
        stored.spec.schedule = "not a cron".to_string();
        let enabled = at(stored.clone(), BackupSchedulePhase::Enabled, 1);

        let err = stored.check_status_write(&enabled, &config).unwrap_err();
        let TransitionError::InvalidSpec { kind, to, errors } = err else {
            panic!("expected InvalidSpec, got {err:?}");
        };
        assert_eq!(kind, "BackupSchedule");
        assert_eq!(to, "Enabled");
        assert!(errors.contains_field("spec.schedule"));

        let failed = at(stored.clone(), BackupSchedulePhase::FailedValidation, 1);
        assert!(stored.check_status_write(&failed, &config).is_ok());
    }

    #[test]
    fn test_schedule_valid_spec_can_be_enabled() {
        let config = OperatorConfig::default();
        let stored = at(valid_schedule(), BackupSchedulePhase::New, 1);
        let enabled = at(stored.clone(), BackupSchedulePhase::Enabled, 1);
        assert!(stored.check_status_write(&enabled, &config).is_ok());
    }

    #[test]
    fn test_schedule_stamp_records_generation_of_verdict() {
        let stored = at(valid_schedule(), BackupSchedulePhase::New, 7);

        let mut enabled = at(stored.clone(), BackupSchedulePhase::Enabled, 7);
        enabled.stamp_status_write(&stored);
        assert_eq!(enabled.status.as_ref().unwrap().observed_generation, Some(7));

        let mut still_new = stored.clone();
        still_new.stamp_status_write(&stored);
        assert_eq!(still_new.status.as_ref().unwrap().observed_generation, None);
    }

    #[test]
    fn test_other_kinds_use_the_phase_machine_for_status_writes() {
        let config = OperatorConfig::default();
        let mut stored = Backup::new("b", BackupSpec::default());
        stored.status = Some(BackupStatus {
            phase: BackupPhase::Complete,
            ..Default::default()
        });
        let mut next = stored.clone();
        next.status.as_mut().unwrap().phase = BackupPhase::Started;

        assert!(matches!(
            stored.check_status_write(&next, &config),
            Err(TransitionError::Illegal { .. })
        ));
    }
}
