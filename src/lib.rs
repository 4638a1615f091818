// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # MySQL Operator - resource model for Kubernetes
//!
//! This library is the control-plane data model of the MySQL Operator: the
//! `mysql.oracle.com/v1alpha1` Custom Resource Definitions and the rules every
//! component applies to them before anything is reconciled.
//!
//! ## Overview
//!
//! - Custom Resource Definitions (CRDs) for clusters, backups, backup schedules
//!   and restores
//! - Defaulting and aggregated validation
//! - Phase state machines that refuse backwards status writes
//! - A typed client façade over the Kubernetes API server, plus an in-memory fake
//! - An admission webhook that applies the same rules at the API server
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`defaults`] - Filling omitted fields
//! - [`validation`] - Checking objects against the operator's rules
//! - [`lifecycle`] - Phase transitions
//! - [`schedule`] - Cron schedules for `BackupSchedule`
//! - [`client`] - Typed client façade
//! - [`webhook`] - Mutating and validating admission webhook
//! - [`config`] - Operator configuration
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use mysql_operator::crd::{Cluster, ClusterSpec};
//! use mysql_operator::defaults::EnsureDefaults;
//! use mysql_operator::validation::Validate;
//!
//! let mut cluster = Cluster::new(
//!     "mycluster",
//!     ClusterSpec {
//!         replicas: 3,
//!         multi_master: true,
//!         ..Default::default()
//!     },
//! );
//! cluster.ensure_defaults();
//! assert_eq!(cluster.spec.base_server_id, 1000);
//! assert!(cluster.validate().is_ok());
//! assert_eq!(cluster.server_ids(), Some(1000..=1002));
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod crd;
pub mod defaults;
pub mod errors;
pub mod field_errors;
pub mod labels;
pub mod lifecycle;
pub mod metrics;
pub mod schedule;
pub mod validation;
pub mod webhook;
