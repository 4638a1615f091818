// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cron schedules for `BackupSchedule`.
//!
//! A schedule is one of:
//!
//! - a standard five-field cron expression
//!   (`minute hour day-of-month month day-of-week`)
//! - a calendar descriptor: `@yearly`, `@annually`, `@monthly`, `@weekly`,
//!   `@daily`, `@midnight` or `@hourly`
//! - a fixed interval, `@every <duration>`, where the duration uses the
//!   `1h30m` / `90s` / `1.5h` notation with units `ns`, `us`, `ms`, `s`, `m`
//!   and `h`
//!
//! Intervals are counted in whole seconds, with a floor of one second.
//! `@reboot` is rejected because it never fires on a running operator.
//!
//! All times are UTC.
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use mysql_operator::schedule::Schedule;
//!
//! let schedule = Schedule::parse("@daily").unwrap();
//! let after = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
//! assert_eq!(
//!     schedule.next_after(after),
//!     Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
//! );
//!
//! let every = Schedule::parse("@every 1h30m").unwrap();
//! assert_eq!(
//!     every.next_after(after),
//!     Some(Utc.with_ymd_and_hms(2024, 1, 1, 13, 30, 0).unwrap())
//! );
//! ```

use crate::crd::{Backup, BackupSchedule, ScheduleStatus};
use crate::defaults::EnsureDefaults;
use crate::errors::ScheduleError;
use crate::labels::{
    BACKUP_SCHEDULE_LABEL, CLUSTER_LABEL, K8S_MANAGED_BY, MANAGED_BY_MYSQL_OPERATOR,
};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use croner::Cron;
use kube::core::duration::ParseError as DurationParseError;
use kube::core::Duration as KubeDuration;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Number of fields in a standard cron expression.
const CRON_FIELDS: usize = 5;

/// Prefix of fixed-interval schedules.
const EVERY_PREFIX: &str = "@every";

/// Timestamp suffix of backups created by a schedule.
const BACKUP_NAME_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

enum Timing {
    Cron(Cron),
    Every(Duration),
}

/// A parsed schedule.
pub struct Schedule {
    expression: String,
    timing: Timing,
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}

impl Schedule {
    /// Parse a cron expression, descriptor or `@every` interval.
    ///
    /// # Errors
    ///
    /// Returns a [`ScheduleError`] describing why `raw` is not a usable schedule.
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScheduleError::Empty);
        }

        if let Some(interval) = every_argument(trimmed) {
            return Self::parse_interval(trimmed, interval);
        }

        let expression = match expand_descriptor(trimmed)? {
            Some(expanded) => expanded.to_string(),
            None => {
                let found = trimmed.split_whitespace().count();
                if found != CRON_FIELDS {
                    return Err(ScheduleError::FieldCount {
                        expr: trimmed.to_string(),
                        found,
                    });
                }
                trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
            }
        };

        let cron = Cron::new(&expression)
            .parse()
            .map_err(|e| ScheduleError::Invalid {
                expr: trimmed.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            expression,
            timing: Timing::Cron(cron),
        })
    }

    fn parse_interval(trimmed: &str, interval: &str) -> Result<Self, ScheduleError> {
        let every = parse_duration(interval).map_err(|reason| ScheduleError::Interval {
            expr: trimmed.to_string(),
            reason,
        })?;
        // whole seconds, never less than one
        let every = Duration::seconds(every.num_seconds().max(1));

        Ok(Self {
            expression: format!("{EVERY_PREFIX} {interval}"),
            timing: Timing::Every(every),
        })
    }

    /// The normalized expression: descriptors expand to five fields and
    /// intervals keep their `@every` form.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The fixed interval of an `@every` schedule.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        match self.timing {
            Timing::Every(every) => Some(every),
            Timing::Cron(_) => None,
        }
    }

    /// First firing time strictly after `after`.
    ///
    /// `None` only for expressions that can never fire, such as `0 0 30 2 *`.
    #[must_use]
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.timing {
            Timing::Cron(cron) => cron.find_next_occurrence(&after, false).ok(),
            Timing::Every(every) => after.trunc_subsecs(0).checked_add_signed(*every),
        }
    }
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Argument of an `@every` schedule, or `None` for anything else.
fn every_argument(raw: &str) -> Option<&str> {
    let (head, rest) = raw.split_at(raw.find(char::is_whitespace).unwrap_or(raw.len()));
    head.eq_ignore_ascii_case(EVERY_PREFIX).then(|| rest.trim())
}

/// Longest `@every` argument accepted, and the most digits one number may
/// carry. Together they keep the total far below `Duration::MAX`.
const MAX_INTERVAL_LEN: usize = 64;
const MAX_INTERVAL_DIGITS: usize = 12;

/// Parse a Go-style duration such as `1h30m`, `90s` or `1.5h`.
fn parse_duration(raw: &str) -> Result<Duration, String> {
    if raw.is_empty() {
        return Err("missing duration".to_string());
    }
    if raw.len() > MAX_INTERVAL_LEN {
        return Err(format!("longer than {MAX_INTERVAL_LEN} characters"));
    }
    // signs, spaces and oversized numbers never reach the arithmetic below
    if let Some(bad) = raw.chars().find(|c| !(c.is_ascii_digit() || *c == '.' || c.is_alphabetic())) {
        return Err(format!("unexpected character '{bad}'"));
    }
    if raw
        .split(|c: char| !c.is_ascii_digit())
        .any(|digits| digits.len() > MAX_INTERVAL_DIGITS)
    {
        return Err("number out of range".to_string());
    }

    let parsed: KubeDuration = raw.parse().map_err(|e: DurationParseError| e.to_string())?;
    Duration::from_std(parsed.into()).map_err(|e| e.to_string())
}

/// Expand a calendar descriptor to its five-field form.
///
/// Returns `Ok(None)` when `raw` is not a descriptor at all.
fn expand_descriptor(raw: &str) -> Result<Option<&'static str>, ScheduleError> {
    if !raw.starts_with('@') {
        return Ok(None);
    }

    let expanded = match raw.to_ascii_lowercase().as_str() {
        "@yearly" | "@annually" => "0 0 1 1 *",
        "@monthly" => "0 0 1 * *",
        "@weekly" => "0 0 * * 0",
        "@daily" | "@midnight" => "0 0 * * *",
        "@hourly" => "0 * * * *",
        _ => return Err(ScheduleError::UnsupportedDescriptor(raw.to_string())),
    };
    Ok(Some(expanded))
}

impl BackupSchedule {
    /// Parse `spec.schedule`.
    ///
    /// # Errors
    ///
    /// Returns a [`ScheduleError`] when the schedule does not parse.
    pub fn parsed_schedule(&self) -> Result<Schedule, ScheduleError> {
        Schedule::parse(&self.spec.schedule)
    }

    /// Next time this schedule fires strictly after `after`.
    ///
    /// # Errors
    ///
    /// Returns a [`ScheduleError`] when the schedule does not parse.
    pub fn next_run_after(
        &self,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, ScheduleError> {
        Ok(self.parsed_schedule()?.next_after(after))
    }

    /// When this schedule last created a backup.
    #[must_use]
    pub fn last_backup(&self) -> Option<DateTime<Utc>> {
        self.status.as_ref().and_then(|s| s.last_backup)
    }

    /// Record that a backup was created at `at`.
    pub fn record_backup(&mut self, at: DateTime<Utc>) {
        self.status
            .get_or_insert_with(ScheduleStatus::default)
            .last_backup = Some(at);
    }

    /// Build the `Backup` this schedule creates when it fires at `now`.
    ///
    /// The backup is named `<schedule>-<yyyymmddhhmmss>`, lives in the
    /// schedule's namespace, copies the template spec, and is labelled with
    /// its cluster, its schedule and the operator version.
    #[must_use]
    pub fn new_backup(&self, now: DateTime<Utc>) -> Backup {
        let schedule_name = self.name_any();
        let name = format!("{schedule_name}-{}", now.format(BACKUP_NAME_TIME_FORMAT));

        let mut labels = BTreeMap::new();
        labels.insert(BACKUP_SCHEDULE_LABEL.to_string(), schedule_name.clone());
        labels.insert(
            K8S_MANAGED_BY.to_string(),
            MANAGED_BY_MYSQL_OPERATOR.to_string(),
        );
        if let Some(cluster) = self
            .spec
            .backup_template
            .cluster
            .as_ref()
            .filter(|c| !c.name.is_empty())
        {
            labels.insert(CLUSTER_LABEL.to_string(), cluster.name.clone());
        }

        let mut backup = Backup::new(&name, self.spec.backup_template.clone());
        backup.metadata.namespace = self.namespace();
        backup.metadata.labels = Some(labels);
        backup.ensure_defaults();

        debug!(
            backupschedule = %schedule_name,
            backup = %backup.name_any(),
            "Built scheduled backup"
        );
        backup
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod schedule_tests;
