// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the MySQL operator.
//!
//! This module provides specialized error types for:
//! - Phase transitions the lifecycle model refuses
//! - Cron schedule parsing for `BackupSchedule`
//! - Client façade operations against the Kubernetes API server
//! - Operator configuration loading
//! - Admission webhook request handling
//!
//! Field-level validation failures live in [`crate::field_errors`] because they
//! are aggregated rather than returned one at a time.

use crate::field_errors::ValidationErrors;
use std::path::PathBuf;
use thiserror::Error;

/// A status write that would move a resource backwards or out of a terminal phase.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested transition is not an edge of the kind's phase machine.
    #[error("illegal {kind} phase transition from '{from}' to '{to}'")]
    Illegal {
        /// Resource kind (e.g. `Backup`)
        kind: &'static str,
        /// Phase currently stored
        from: String,
        /// Phase the writer asked for
        to: String,
    },

    /// The phase may only be entered by an object whose spec validates.
    #[error("{kind} cannot enter phase '{to}' while its spec is invalid: {errors}")]
    InvalidSpec {
        /// Resource kind (e.g. `BackupSchedule`)
        kind: &'static str,
        /// Phase the writer asked for
        to: String,
        /// Violations found in the stored spec
        errors: ValidationErrors,
    },
}

/// Errors produced while parsing a `BackupSchedule` cron string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Schedule string is empty or whitespace.
    #[error("schedule must not be empty")]
    Empty,

    /// Descriptor other than the calendar ones and `@every`, such as `@reboot`.
    #[error("unsupported schedule descriptor '{0}'")]
    UnsupportedDescriptor(String),

    /// `@every` followed by something that is not a duration.
    #[error("invalid interval in schedule '{expr}': {reason}")]
    Interval {
        /// Offending expression
        expr: String,
        /// Why the duration does not parse
        reason: String,
    },

    /// Standard cron expressions carry exactly five fields.
    #[error("expected exactly 5 fields in schedule '{expr}', found {found}")]
    FieldCount {
        /// Offending expression
        expr: String,
        /// Number of whitespace-separated fields found
        found: usize,
    },

    /// The expression has five fields but one of them does not parse.
    #[error("invalid schedule '{expr}': {reason}")]
    Invalid {
        /// Offending expression
        expr: String,
        /// Parser message
        reason: String,
    },
}

/// Errors surfaced by the client façade.
///
/// `NotFound` and `Conflict` are mapped from API server status codes 404 and 409
/// so callers can branch on them without inspecting `kube::Error`.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Object does not exist (HTTP 404)
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Resource kind
        kind: &'static str,
        /// Object name
        name: String,
    },

    /// Stale `resourceVersion` or name collision (HTTP 409)
    #[error("{kind} '{name}' conflict: {message}")]
    Conflict {
        /// Resource kind
        kind: &'static str,
        /// Object name
        name: String,
        /// Server-provided reason
        message: String,
    },

    /// The object failed validation after defaulting; nothing was written.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A status write would have performed an illegal phase transition.
    #[error(transparent)]
    IllegalTransition(#[from] TransitionError),

    /// The object has no `metadata.name`.
    #[error("{kind} object has no name")]
    MissingName {
        /// Resource kind
        kind: &'static str,
    },

    /// The watch stream reported an error event.
    #[error("watch error: {0}")]
    Watch(String),

    /// Patch bytes or objects could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other API server or transport error.
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl ClientError {
    /// Map a `kube::Error` to `NotFound`/`Conflict` when the status code says so.
    #[must_use]
    pub fn from_kube(kind: &'static str, name: &str, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => Self::NotFound {
                kind,
                name: name.to_string(),
            },
            kube::Error::Api(ae) if ae.code == 409 => Self::Conflict {
                kind,
                name: name.to_string(),
                message: ae.message,
            },
            other => Self::Kube(other),
        }
    }

    /// Whether this error is a 404
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error is a 409
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Errors raised while loading the operator configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for [`crate::config::OperatorConfig`].
    #[error("failed to parse operator config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Config parsed but is internally inconsistent.
    #[error("invalid operator config: {0}")]
    Invalid(String),

    /// [`crate::config::install_global`] was called twice.
    #[error("operator config already installed")]
    AlreadyInstalled,
}

/// Errors raised while decoding or answering an admission review.
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The review carries a kind this webhook does not serve.
    #[error("unsupported kind '{0}'")]
    UnsupportedKind(String),

    /// The review has no `object` to act on.
    #[error("admission request has no object")]
    MissingObject,

    /// The object does not decode into the typed resource.
    #[error("failed to decode {kind}: {source}")]
    Decode {
        /// Kind being decoded
        kind: String,
        /// serde error
        #[source]
        source: serde_json::Error,
    },

    /// The typed resource could not be re-encoded for diffing.
    #[error("failed to encode object: {0}")]
    Encode(#[from] serde_json::Error),
}
