// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Phase state machines for the MySQL operator resources.
//!
//! Phases only move forward. The reconciler is the only writer, but replayed or
//! out-of-order status writes happen in practice, so every write is checked
//! against the machine for its kind and illegal moves are rejected, logged and
//! counted.
//!
//! | Kind             | Forward edges                                                   |
//! |------------------|-----------------------------------------------------------------|
//! | `Cluster`        | Pending → Running → {Succeeded, Failed}; Pending → Failed; any → Unknown; Unknown → {Pending, Running, Failed} |
//! | `Backup`         | New → Scheduled → Started → Complete; non-terminal → Failed     |
//! | `Restore`        | same as `Backup`                                                |
//! | `BackupSchedule` | New → {Enabled, FailedValidation}; {Enabled, FailedValidation} → New on spec edit |
//!
//! Rewriting the current phase is never a transition and is always accepted.
//!
//! Phase enums only know their edges. A whole status write is checked with
//! [`HasPhase::check_status_write`], which also looks at the resource: a
//! `BackupSchedule` leaves `Enabled` or `FailedValidation` only once its spec
//! was edited after the phase was decided, and enters `Enabled` only while its
//! spec validates.
//!
//! # Example
//!
//! ```rust
//! use mysql_operator::crd::BackupPhase;
//! use mysql_operator::lifecycle::PhaseTransition;
//!
//! assert!(BackupPhase::Started.check_transition(BackupPhase::Complete).is_ok());
//! assert!(BackupPhase::Complete.check_transition(BackupPhase::Started).is_err());
//! ```

use crate::config::OperatorConfig;
use crate::constants::{KIND_BACKUP, KIND_BACKUP_SCHEDULE, KIND_CLUSTER, KIND_RESTORE};
use crate::crd::{
    Backup, BackupPhase, BackupSchedule, BackupSchedulePhase, BackupStatus, Cluster, ClusterPhase,
    ClusterStatus, Restore, RestorePhase, RestoreStatus, ScheduleStatus,
};
use crate::errors::TransitionError;
use crate::metrics;
use crate::validation::Validate;
use kube::ResourceExt;
use std::fmt;
use tracing::error;

/// A closed set of lifecycle phases with a transition relation.
pub trait PhaseTransition: Copy + Eq + fmt::Debug + fmt::Display {
    /// Resource kind the machine belongs to, used in errors and metrics.
    const KIND: &'static str;

    /// Whether `self -> next` is an edge of the machine (or a no-op rewrite).
    fn can_transition_to(self, next: Self) -> bool;

    /// Terminal phases accept no further transitions except where noted.
    fn is_terminal(self) -> bool;

    /// Check a transition, logging and counting it when it is illegal.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] when `self -> next` is not allowed.
    fn check_transition(self, next: Self) -> Result<(), TransitionError> {
        if self.can_transition_to(next) {
            return Ok(());
        }

        error!(
            kind = Self::KIND,
            from = %self,
            to = %next,
            "Rejected illegal phase transition"
        );
        metrics::record_illegal_transition(Self::KIND);

        Err(TransitionError::Illegal {
            kind: Self::KIND,
            from: self.to_string(),
            to: next.to_string(),
        })
    }
}

/// A resource whose status carries a phase.
pub trait HasPhase: Sized {
    type Phase: PhaseTransition;

    /// Phase currently recorded in status; the zero phase when status is absent.
    fn current_phase(&self) -> Self::Phase;

    /// Check replacing the status of `self` (the stored object) with the
    /// status carried by `next`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] when the write is refused.
    fn check_status_write(
        &self,
        next: &Self,
        _config: &OperatorConfig,
    ) -> Result<(), TransitionError> {
        self.current_phase().check_transition(next.current_phase())
    }

    /// Fill in status bookkeeping on `next` before it replaces the status of
    /// `stored`.
    fn stamp_status_write(&mut self, _stored: &Self) {}
}

// ============================================================================
// Cluster
// ============================================================================

impl PhaseTransition for ClusterPhase {
    const KIND: &'static str = KIND_CLUSTER;

    fn can_transition_to(self, next: Self) -> bool {
        use ClusterPhase::{Failed, Pending, Running, Succeeded, Unknown};

        if self == next || next == Unknown {
            return true;
        }
        matches!(
            (self, next),
            (Unknown, Pending | Running | Failed)
                | (Pending, Running | Failed)
                | (Running, Succeeded | Failed)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, ClusterPhase::Succeeded | ClusterPhase::Failed)
    }
}

impl HasPhase for Cluster {
    type Phase = ClusterPhase;

    fn current_phase(&self) -> ClusterPhase {
        self.phase()
    }
}

impl ClusterStatus {
    /// Move to `next` if the cluster machine allows it.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] and leaves the status untouched.
    pub fn transition_to(&mut self, next: ClusterPhase) -> Result<(), TransitionError> {
        self.phase.check_transition(next)?;
        self.phase = next;
        Ok(())
    }
}

// ============================================================================
// Backup and Restore
// ============================================================================

/// Shared shape of the backup and restore machines.
#[derive(Clone, Copy, PartialEq, Eq)]
enum JobStep {
    New,
    Scheduled,
    Started,
    Complete,
    Failed,
}

impl JobStep {
    fn can_transition_to(self, next: Self) -> bool {
        use JobStep::{Complete, Failed, New, Scheduled, Started};

        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (New, Scheduled)
                | (Scheduled, Started)
                | (Started, Complete)
                | (New | Scheduled | Started, Failed)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, JobStep::Complete | JobStep::Failed)
    }
}

impl From<BackupPhase> for JobStep {
    fn from(phase: BackupPhase) -> Self {
        match phase {
            BackupPhase::Unknown | BackupPhase::New => Self::New,
            BackupPhase::Scheduled => Self::Scheduled,
            BackupPhase::Started => Self::Started,
            BackupPhase::Complete => Self::Complete,
            BackupPhase::Failed => Self::Failed,
        }
    }
}

impl From<RestorePhase> for JobStep {
    fn from(phase: RestorePhase) -> Self {
        match phase {
            RestorePhase::Unknown | RestorePhase::New => Self::New,
            RestorePhase::Scheduled => Self::Scheduled,
            RestorePhase::Started => Self::Started,
            RestorePhase::Complete => Self::Complete,
            RestorePhase::Failed => Self::Failed,
        }
    }
}

impl PhaseTransition for BackupPhase {
    const KIND: &'static str = KIND_BACKUP;

    fn can_transition_to(self, next: Self) -> bool {
        JobStep::from(self).can_transition_to(JobStep::from(next))
    }

    fn is_terminal(self) -> bool {
        JobStep::from(self).is_terminal()
    }
}

impl PhaseTransition for RestorePhase {
    const KIND: &'static str = KIND_RESTORE;

    fn can_transition_to(self, next: Self) -> bool {
        JobStep::from(self).can_transition_to(JobStep::from(next))
    }

    fn is_terminal(self) -> bool {
        JobStep::from(self).is_terminal()
    }
}

impl HasPhase for Backup {
    type Phase = BackupPhase;

    fn current_phase(&self) -> BackupPhase {
        self.phase()
    }
}

impl HasPhase for Restore {
    type Phase = RestorePhase;

    fn current_phase(&self) -> RestorePhase {
        self.phase()
    }
}

impl BackupStatus {
    /// Move to `next` if the backup machine allows it.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] and leaves the status untouched.
    pub fn transition_to(&mut self, next: BackupPhase) -> Result<(), TransitionError> {
        self.phase.check_transition(next)?;
        self.phase = next;
        Ok(())
    }
}

impl RestoreStatus {
    /// Move to `next` if the restore machine allows it.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] and leaves the status untouched.
    pub fn transition_to(&mut self, next: RestorePhase) -> Result<(), TransitionError> {
        self.phase.check_transition(next)?;
        self.phase = next;
        Ok(())
    }
}

// ============================================================================
// BackupSchedule
// ============================================================================

impl PhaseTransition for BackupSchedulePhase {
    const KIND: &'static str = KIND_BACKUP_SCHEDULE;

    fn can_transition_to(self, next: Self) -> bool {
        use BackupSchedulePhase::{Enabled, FailedValidation, New, Unknown};

        if self == next {
            return true;
        }
        // back to New only through BackupSchedule::check_status_write
        matches!(
            (self, next),
            (Unknown, New | Enabled | FailedValidation) | (New, Enabled | FailedValidation)
        )
    }

    /// `FailedValidation` is terminal until a spec edit resets it to `New`.
    fn is_terminal(self) -> bool {
        self == BackupSchedulePhase::FailedValidation
    }
}

impl HasPhase for BackupSchedule {
    type Phase = BackupSchedulePhase;

    fn current_phase(&self) -> BackupSchedulePhase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }

    fn check_status_write(
        &self,
        next: &Self,
        config: &OperatorConfig,
    ) -> Result<(), TransitionError> {
        use BackupSchedulePhase::{Enabled, FailedValidation, New};

        let from = self.current_phase();
        let to = next.current_phase();
        if from == to {
            return Ok(());
        }
        if matches!(from, Enabled | FailedValidation) && to == New && self.edited_since_status() {
            return Ok(());
        }

        from.check_transition(to)?;

        if to == Enabled {
            if let Err(errors) = self.validate_with(config) {
                error!(
                    kind = KIND_BACKUP_SCHEDULE,
                    name = %self.name_any(),
                    violations = errors.len(),
                    "Rejected enabling a schedule whose spec is invalid"
                );
                metrics::record_illegal_transition(KIND_BACKUP_SCHEDULE);
                return Err(TransitionError::InvalidSpec {
                    kind: KIND_BACKUP_SCHEDULE,
                    to: to.to_string(),
                    errors,
                });
            }
        }
        Ok(())
    }

    /// Record the generation a verdict (`Enabled` or `FailedValidation`) was
    /// reached on.
    fn stamp_status_write(&mut self, stored: &Self) {
        let generation = stored.metadata.generation;
        if let Some(status) = self.status.as_mut() {
            if matches!(
                status.phase,
                BackupSchedulePhase::Enabled | BackupSchedulePhase::FailedValidation
            ) && status.phase != stored.current_phase()
            {
                status.observed_generation = generation;
            }
        }
    }
}

impl BackupSchedule {
    /// Whether the spec changed after the current phase was decided.
    ///
    /// A status without `observedGeneration` predates the field, so any
    /// generation counts as newer.
    #[must_use]
    pub fn edited_since_status(&self) -> bool {
        let observed = self
            .status
            .as_ref()
            .and_then(|s| s.observed_generation)
            .unwrap_or(0);
        self.metadata.generation.unwrap_or(0) > observed
    }
}

impl ScheduleStatus {
    /// Move to `next` if the schedule machine allows it.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] and leaves the status untouched.
    pub fn transition_to(&mut self, next: BackupSchedulePhase) -> Result<(), TransitionError> {
        self.phase.check_transition(next)?;
        self.phase = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod lifecycle_tests;
