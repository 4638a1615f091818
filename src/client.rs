// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed client façade for the MySQL operator resources.
//!
//! Every resource kind gets the same set of operations through
//! [`ResourceClient`]. Two implementations exist:
//!
//! - [`KubeResourceClient`] talks to the API server through [`kube::Api`]
//! - [`fake::FakeClient`] keeps objects in memory for tests
//!
//! Both enforce the same rules on the way in:
//!
//! - `create`, `update` and `patch` apply defaults and validate the object
//!   that would be stored; an invalid object is never written
//! - `update` is rejected with [`ClientError::Conflict`] when the caller holds a
//!   stale `resourceVersion`
//! - `update_status` refuses status writes the lifecycle forbids
//!
//! `list`, `watch` and `delete_collection` filter with a
//! [`kube::core::Selector`]; an empty selector matches everything.
//!
//! # Example
//!
//! ```rust,no_run
//! use mysql_operator::client::{KubeResourceClient, ResourceClient};
//! use mysql_operator::crd::Cluster;
//! use kube::core::Selector;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = kube::Client::try_default().await?;
//! let clusters: KubeResourceClient<Cluster> = KubeResourceClient::new(client, "default");
//! for cluster in clusters.list(&Selector::default()).await? {
//!     println!("{:?}", cluster.metadata.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod fake;

use crate::config;
use crate::constants::{KIND_BACKUP, KIND_BACKUP_SCHEDULE, KIND_CLUSTER, KIND_RESTORE};
use crate::crd::{
    Backup, BackupSchedule, BackupStatus, Cluster, ClusterStatus, Restore, RestoreStatus,
    ScheduleStatus,
};
use crate::defaults::EnsureDefaults;
use crate::errors::ClientError;
use crate::lifecycle::HasPhase;
use crate::metrics;
use crate::validation::Validate;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use kube::api::{
    Api, DeleteParams, ListParams, Patch, PatchParams, PostParams, WatchEvent, WatchParams,
};
use kube::core::{NamespaceResourceScope, Selector};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Debug;
use tracing::{debug, warn};

/// A resource kind served by the operator.
///
/// Ties together everything the façade needs: kube metadata, serde, defaulting,
/// validation and a phase machine on the status.
pub trait OperatorResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + EnsureDefaults
    + Validate
    + HasPhase
    + Send
    + Sync
    + 'static
{
    /// Kind name used in errors, logs and metrics.
    const KIND: &'static str;

    /// Status subresource payload.
    type Status: Clone + Debug + Serialize + Send + Sync;

    fn status(&self) -> Option<&Self::Status>;

    fn status_mut(&mut self) -> &mut Option<Self::Status>;
}

macro_rules! impl_operator_resource {
    ($resource:ty, $status:ty, $kind:expr) => {
        impl OperatorResource for $resource {
            const KIND: &'static str = $kind;

            type Status = $status;

            fn status(&self) -> Option<&$status> {
                self.status.as_ref()
            }

            fn status_mut(&mut self) -> &mut Option<$status> {
                &mut self.status
            }
        }
    };
}

impl_operator_resource!(Cluster, ClusterStatus, KIND_CLUSTER);
impl_operator_resource!(Backup, BackupStatus, KIND_BACKUP);
impl_operator_resource!(BackupSchedule, ScheduleStatus, KIND_BACKUP_SCHEDULE);
impl_operator_resource!(Restore, RestoreStatus, KIND_RESTORE);

/// A change observed on a watched resource.
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceEvent<K> {
    Added(K),
    Modified(K),
    Deleted(K),
}

impl<K> ResourceEvent<K> {
    /// The object the event carries.
    pub fn object(&self) -> &K {
        match self {
            Self::Added(obj) | Self::Modified(obj) | Self::Deleted(obj) => obj,
        }
    }

    pub fn into_object(self) -> K {
        match self {
            Self::Added(obj) | Self::Modified(obj) | Self::Deleted(obj) => obj,
        }
    }
}

/// Stream returned by [`ResourceClient::watch`].
pub type EventStream<K> = BoxStream<'static, Result<ResourceEvent<K>, ClientError>>;

/// Namespaced operations on one resource kind.
#[async_trait]
pub trait ResourceClient<K: OperatorResource>: Send + Sync {
    /// Fetch one object by name.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] when no such object exists.
    async fn get(&self, name: &str) -> Result<K, ClientError>;

    /// List objects whose labels match `selector`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API server call fails.
    async fn list(&self, selector: &Selector) -> Result<Vec<K>, ClientError>;

    /// Stream changes to objects matching `selector`.
    ///
    /// Existing objects are delivered first as `Added` events.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch cannot be opened.
    async fn watch(&self, selector: &Selector) -> Result<EventStream<K>, ClientError>;

    /// Default, validate and store a new object.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] with every violation when the defaulted
    /// object is invalid; [`ClientError::Conflict`] when the name is taken.
    async fn create(&self, obj: K) -> Result<K, ClientError>;

    /// Default, validate and replace the spec and metadata of an existing object.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when the defaulted object is invalid;
    /// [`ClientError::Conflict`] when `metadata.resourceVersion` is stale.
    async fn update(&self, obj: K) -> Result<K, ClientError>;

    /// Write the status subresource.
    ///
    /// # Errors
    ///
    /// [`ClientError::IllegalTransition`] when the stored object cannot take
    /// the status carried by `obj`.
    async fn update_status(&self, obj: K) -> Result<K, ClientError>;

    /// Delete one object by name.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] when no such object exists.
    async fn delete(&self, name: &str) -> Result<(), ClientError>;

    /// Delete every object matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API server call fails.
    async fn delete_collection(&self, selector: &Selector) -> Result<(), ClientError>;

    /// Apply a JSON merge patch to the named object.
    ///
    /// The merged object is defaulted and validated before it is stored.
    /// Status is not patchable here.
    ///
    /// # Errors
    ///
    /// [`ClientError::Serialization`] when `patch` is not JSON;
    /// [`ClientError::NotFound`] when no such object exists;
    /// [`ClientError::Validation`] when the merged object is invalid.
    async fn patch(&self, name: &str, patch: &[u8]) -> Result<K, ClientError>;
}

/// Apply defaults and validate an object about to be created or replaced.
///
/// # Errors
///
/// [`ClientError::Validation`] carrying every violation.
pub fn prepare_for_write<K: OperatorResource>(verb: &str, obj: &mut K) -> Result<(), ClientError> {
    obj.ensure_defaults();
    obj.validate().map_err(|errs| {
        metrics::record_validation_failure(K::KIND);
        warn!(kind = K::KIND, verb, name = %obj.name_any(), error = %errs, "Refusing to write invalid object");
        ClientError::Validation(errs)
    })
}

/// Refuse a status write the lifecycle forbids.
///
/// # Errors
///
/// [`ClientError::IllegalTransition`] for a forbidden write.
pub fn check_status_write<K: OperatorResource>(stored: &K, next: &K) -> Result<(), ClientError> {
    stored
        .check_status_write(next, config::global())
        .map_err(ClientError::from)
}

/// Apply a JSON merge patch to `stored`. Name and status are kept.
pub(crate) fn merge_patch<K: OperatorResource>(stored: &K, patch: &Value) -> Result<K, ClientError> {
    let mut doc = serde_json::to_value(stored)?;
    json_patch::merge(&mut doc, patch);
    let mut patched: K = serde_json::from_value(doc)?;

    patched.meta_mut().name.clone_from(&stored.meta().name);
    *patched.status_mut() = stored.status().cloned();
    Ok(patched)
}

/// Name of an object about to be written, or [`ClientError::MissingName`].
pub(crate) fn required_name<K: OperatorResource>(obj: &K) -> Result<String, ClientError> {
    obj.meta()
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or(ClientError::MissingName { kind: K::KIND })
}

/// Metric label for the outcome of a façade call.
fn outcome<T>(result: &Result<T, ClientError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(ClientError::NotFound { .. }) => "not_found",
        Err(ClientError::Conflict { .. }) => "conflict",
        Err(ClientError::Validation(_)) => "invalid",
        Err(ClientError::IllegalTransition(_)) => "illegal_transition",
        Err(_) => "error",
    }
}

/// Count a finished façade call and hand the result back.
pub(crate) fn observe<K: OperatorResource, T>(
    verb: &str,
    result: Result<T, ClientError>,
) -> Result<T, ClientError> {
    metrics::record_client_request(K::KIND, verb, outcome(&result));
    result
}

// ============================================================================
// API server implementation
// ============================================================================

/// [`ResourceClient`] backed by a namespaced [`kube::Api`].
pub struct KubeResourceClient<K> {
    api: Api<K>,
}

impl<K: OperatorResource> KubeResourceClient<K> {
    /// Client for objects of kind `K` in `namespace`.
    #[must_use]
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
        }
    }

    /// The underlying kube API handle.
    #[must_use]
    pub fn api(&self) -> &Api<K> {
        &self.api
    }
}

fn list_params(selector: &Selector) -> ListParams {
    ListParams::default().labels_from(selector)
}

#[async_trait]
impl<K: OperatorResource> ResourceClient<K> for KubeResourceClient<K> {
    async fn get(&self, name: &str) -> Result<K, ClientError> {
        let result = self
            .api
            .get(name)
            .await
            .map_err(|e| ClientError::from_kube(K::KIND, name, e));
        observe::<K, _>("get", result)
    }

    async fn list(&self, selector: &Selector) -> Result<Vec<K>, ClientError> {
        let result = self
            .api
            .list(&list_params(selector))
            .await
            .map(|list| list.items)
            .map_err(ClientError::from);
        observe::<K, _>("list", result)
    }

    async fn watch(&self, selector: &Selector) -> Result<EventStream<K>, ClientError> {
        let params = WatchParams::default().labels_from(selector);
        let result = self.api.watch(&params, "0").await.map_err(ClientError::from);
        let events = observe::<K, _>("watch", result)?;

        let stream = events
            .map_err(ClientError::from)
            .try_filter_map(|event| async move {
                match event {
                    WatchEvent::Added(obj) => Ok(Some(ResourceEvent::Added(obj))),
                    WatchEvent::Modified(obj) => Ok(Some(ResourceEvent::Modified(obj))),
                    WatchEvent::Deleted(obj) => Ok(Some(ResourceEvent::Deleted(obj))),
                    WatchEvent::Bookmark(_) => Ok(None),
                    WatchEvent::Error(e) => Err(ClientError::Watch(e.message)),
                }
            });
        Ok(stream.boxed())
    }

    async fn create(&self, mut obj: K) -> Result<K, ClientError> {
        let result = async {
            prepare_for_write("create", &mut obj)?;
            self.api
                .create(&PostParams::default(), &obj)
                .await
                .map_err(|e| ClientError::from_kube(K::KIND, &obj.name_any(), e))
        }
        .await;

        if let Ok(created) = &result {
            debug!(kind = K::KIND, name = %created.name_any(), "Created object");
        }
        observe::<K, _>("create", result)
    }

    async fn update(&self, mut obj: K) -> Result<K, ClientError> {
        let result = async {
            let name = required_name(&obj)?;
            prepare_for_write("update", &mut obj)?;
            self.api
                .replace(&name, &PostParams::default(), &obj)
                .await
                .map_err(|e| ClientError::from_kube(K::KIND, &name, e))
        }
        .await;
        observe::<K, _>("update", result)
    }

    async fn update_status(&self, mut obj: K) -> Result<K, ClientError> {
        let result = async {
            let name = required_name(&obj)?;
            let stored = self
                .api
                .get(&name)
                .await
                .map_err(|e| ClientError::from_kube(K::KIND, &name, e))?;
            check_status_write(&stored, &obj)?;
            obj.stamp_status_write(&stored);

            // resourceVersion in a merge patch acts as a precondition
            let patch = json!({
                "metadata": { "resourceVersion": obj.resource_version() },
                "status": obj.status(),
            });
            self.api
                .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
                .await
                .map_err(|e| ClientError::from_kube(K::KIND, &name, e))
        }
        .await;
        observe::<K, _>("update_status", result)
    }

    async fn delete(&self, name: &str) -> Result<(), ClientError> {
        let result = self
            .api
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| ClientError::from_kube(K::KIND, name, e));
        observe::<K, _>("delete", result)
    }

    async fn delete_collection(&self, selector: &Selector) -> Result<(), ClientError> {
        let result = self
            .api
            .delete_collection(&DeleteParams::default(), &list_params(selector))
            .await
            .map(|_| ())
            .map_err(ClientError::from);
        observe::<K, _>("delete_collection", result)
    }

    async fn patch(&self, name: &str, patch: &[u8]) -> Result<K, ClientError> {
        let result = async {
            let patch: Value = serde_json::from_slice(patch)?;
            let stored = self
                .api
                .get(name)
                .await
                .map_err(|e| ClientError::from_kube(K::KIND, name, e))?;

            // validate the merged object, then replace it guarded by the
            // resourceVersion it was merged onto
            let mut patched = merge_patch(&stored, &patch)?;
            patched.meta_mut().resource_version = stored.resource_version();
            prepare_for_write("patch", &mut patched)?;
            self.api
                .replace(name, &PostParams::default(), &patched)
                .await
                .map_err(|e| ClientError::from_kube(K::KIND, name, e))
        }
        .await;
        observe::<K, _>("patch", result)
    }
}
