// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`ResourceClient`] for tests.
//!
//! `FakeClient` behaves like a single namespace of an API server: it assigns
//! `resourceVersion`s, rejects stale updates with a conflict, defaults and
//! validates every spec write, keeps the status subresource separate from the
//! spec, and fans changes out to watchers.
//!
//! Clones share the same store, so one clone can drive writes while another
//! observes them.
//!
//! # Example
//!
//! ```rust,no_run
//! use mysql_operator::client::fake::FakeClient;
//! use mysql_operator::client::ResourceClient;
//! use mysql_operator::crd::{Cluster, ClusterSpec};
//!
//! # async fn example() -> Result<(), mysql_operator::errors::ClientError> {
//! let clusters: FakeClient<Cluster> = FakeClient::new("default");
//! let created = clusters
//!     .create(Cluster::new("mycluster", ClusterSpec::default()))
//!     .await?;
//! assert_eq!(created.spec.replicas, 1);
//! # Ok(())
//! # }
//! ```

use super::{
    check_status_write, merge_patch, observe, prepare_for_write, required_name, EventStream,
    OperatorResource, ResourceClient, ResourceEvent,
};
use crate::errors::ClientError;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use kube::core::{Selector, SelectorExt};
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

type EventSender<K> = mpsc::UnboundedSender<Result<ResourceEvent<K>, ClientError>>;

struct Watcher<K> {
    selector: Selector,
    tx: EventSender<K>,
}

struct Store<K> {
    objects: BTreeMap<String, K>,
    last_version: u64,
    generated_names: u64,
    watchers: Vec<Watcher<K>>,
}

impl<K: OperatorResource> Store<K> {
    fn next_version(&mut self) -> String {
        self.last_version += 1;
        self.last_version.to_string()
    }

    fn get(&self, name: &str) -> Result<&K, ClientError> {
        self.objects.get(name).ok_or_else(|| ClientError::NotFound {
            kind: K::KIND,
            name: name.to_string(),
        })
    }

    /// Reject a write carrying a `resourceVersion` other than the stored one.
    fn check_version(&self, incoming: &K, name: &str) -> Result<(), ClientError> {
        let stored = self.get(name)?;
        match incoming.resource_version() {
            Some(version) if Some(&version) != stored.meta().resource_version.as_ref() => {
                Err(ClientError::Conflict {
                    kind: K::KIND,
                    name: name.to_string(),
                    message: format!(
                        "the object has been modified; resourceVersion {version} is stale"
                    ),
                })
            }
            _ => Ok(()),
        }
    }

    /// Deliver `event` to every live watcher whose selector matches.
    fn notify(&mut self, event: &ResourceEvent<K>) {
        let labels = event.object().labels().clone();
        self.watchers.retain(|w| {
            if !w.selector.matches(&labels) {
                return !w.tx.is_closed();
            }
            w.tx.unbounded_send(Ok(event.clone())).is_ok()
        });
    }

    /// Store `obj` under `name` with a fresh `resourceVersion`.
    fn commit(&mut self, name: String, mut obj: K) -> K {
        obj.meta_mut().resource_version = Some(self.next_version());
        self.objects.insert(name, obj.clone());
        obj
    }

    fn create(&mut self, namespace: &str, mut obj: K) -> Result<K, ClientError> {
        let name = match obj.meta().name.clone().filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => {
                let prefix = obj
                    .meta()
                    .generate_name
                    .clone()
                    .ok_or(ClientError::MissingName { kind: K::KIND })?;
                self.generated_names += 1;
                let name = format!("{prefix}{:05x}", self.generated_names);
                obj.meta_mut().name = Some(name.clone());
                name
            }
        };

        if self.objects.contains_key(&name) {
            return Err(ClientError::Conflict {
                kind: K::KIND,
                name,
                message: "object already exists".to_string(),
            });
        }

        obj.meta_mut().namespace = Some(namespace.to_string());
        obj.meta_mut().generation = Some(1);
        let created = self.commit(name, obj);
        self.notify(&ResourceEvent::Added(created.clone()));
        debug!(kind = K::KIND, name = %created.name_any(), "Created object");
        Ok(created)
    }

    fn update(&mut self, namespace: &str, mut obj: K) -> Result<K, ClientError> {
        let name = required_name(&obj)?;
        self.check_version(&obj, &name)?;
        let stored = self.get(&name)?;

        // status only changes through update_status
        *obj.status_mut() = stored.status().cloned();
        obj.meta_mut().namespace = Some(namespace.to_string());
        obj.meta_mut().generation = Some(stored.meta().generation.unwrap_or(1) + 1);
        prepare_for_write("update", &mut obj)?;

        let updated = self.commit(name, obj);
        self.notify(&ResourceEvent::Modified(updated.clone()));
        Ok(updated)
    }

    fn update_status(&mut self, mut obj: K) -> Result<K, ClientError> {
        let name = required_name(&obj)?;
        self.check_version(&obj, &name)?;
        let stored = self.get(&name)?;
        check_status_write(stored, &obj)?;
        obj.stamp_status_write(stored);

        let mut next = stored.clone();
        *next.status_mut() = obj.status().cloned();

        let updated = self.commit(name, next);
        self.notify(&ResourceEvent::Modified(updated.clone()));
        Ok(updated)
    }

    fn merge_patch(&mut self, namespace: &str, name: &str, patch: &[u8]) -> Result<K, ClientError> {
        let patch: serde_json::Value = serde_json::from_slice(patch)?;
        let stored = self.get(name)?;

        let mut patched = merge_patch(stored, &patch)?;
        patched.meta_mut().namespace = Some(namespace.to_string());
        patched.meta_mut().generation = Some(stored.meta().generation.unwrap_or(1) + 1);
        prepare_for_write("patch", &mut patched)?;

        let updated = self.commit(name.to_string(), patched);
        self.notify(&ResourceEvent::Modified(updated.clone()));
        Ok(updated)
    }
}

/// Single-namespace in-memory store implementing [`ResourceClient`].
pub struct FakeClient<K> {
    namespace: String,
    store: Arc<Mutex<Store<K>>>,
}

impl<K> Clone for FakeClient<K> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<K: OperatorResource> FakeClient<K> {
    /// Empty store for objects in `namespace`.
    #[must_use]
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            store: Arc::new(Mutex::new(Store {
                objects: BTreeMap::new(),
                last_version: 0,
                generated_names: 0,
                watchers: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Put `obj` in the store as is, skipping defaulting and validation.
    ///
    /// Useful for seeding objects a newer or older operator wrote.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingName`] when `obj` has no name.
    pub async fn seed(&self, mut obj: K) -> Result<K, ClientError> {
        let name = required_name(&obj)?;
        obj.meta_mut().namespace = Some(self.namespace.clone());
        let mut store = self.store.lock().await;
        let stored = store.commit(name, obj);
        store.notify(&ResourceEvent::Added(stored.clone()));
        Ok(stored)
    }

    /// Number of objects currently stored.
    pub async fn len(&self) -> usize {
        self.store.lock().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl<K: OperatorResource> ResourceClient<K> for FakeClient<K> {
    async fn get(&self, name: &str) -> Result<K, ClientError> {
        let store = self.store.lock().await;
        observe::<K, _>("get", store.get(name).cloned())
    }

    async fn list(&self, selector: &Selector) -> Result<Vec<K>, ClientError> {
        let store = self.store.lock().await;
        let items = store
            .objects
            .values()
            .filter(|obj| selector.matches(obj.labels()))
            .cloned()
            .collect();
        observe::<K, _>("list", Ok(items))
    }

    async fn watch(&self, selector: &Selector) -> Result<EventStream<K>, ClientError> {
        let (tx, rx) = mpsc::unbounded();
        let mut store = self.store.lock().await;

        for obj in store.objects.values() {
            if selector.matches(obj.labels()) {
                // rx is still held here, so the send cannot fail
                let _ = tx.unbounded_send(Ok(ResourceEvent::Added(obj.clone())));
            }
        }
        store.watchers.push(Watcher {
            selector: selector.clone(),
            tx,
        });

        observe::<K, _>("watch", Ok(rx.boxed()))
    }

    async fn create(&self, mut obj: K) -> Result<K, ClientError> {
        let mut store = self.store.lock().await;
        let result = prepare_for_write("create", &mut obj).and_then(|()| store.create(&self.namespace, obj));
        observe::<K, _>("create", result)
    }

    async fn update(&self, obj: K) -> Result<K, ClientError> {
        let mut store = self.store.lock().await;
        observe::<K, _>("update", store.update(&self.namespace, obj))
    }

    async fn update_status(&self, obj: K) -> Result<K, ClientError> {
        let mut store = self.store.lock().await;
        observe::<K, _>("update_status", store.update_status(obj))
    }

    async fn delete(&self, name: &str) -> Result<(), ClientError> {
        let mut store = self.store.lock().await;
        let result = match store.objects.remove(name) {
            Some(removed) => {
                store.notify(&ResourceEvent::Deleted(removed));
                Ok(())
            }
            None => Err(ClientError::NotFound {
                kind: K::KIND,
                name: name.to_string(),
            }),
        };
        observe::<K, _>("delete", result)
    }

    async fn delete_collection(&self, selector: &Selector) -> Result<(), ClientError> {
        let mut store = self.store.lock().await;
        let doomed: Vec<String> = store
            .objects
            .iter()
            .filter(|(_, obj)| selector.matches(obj.labels()))
            .map(|(name, _)| name.clone())
            .collect();

        for name in doomed {
            if let Some(removed) = store.objects.remove(&name) {
                store.notify(&ResourceEvent::Deleted(removed));
            }
        }
        observe::<K, _>("delete_collection", Ok(()))
    }

    async fn patch(&self, name: &str, patch: &[u8]) -> Result<K, ClientError> {
        let mut store = self.store.lock().await;
        observe::<K, _>("patch", store.merge_patch(&self.namespace, name, patch))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod fake_tests;
