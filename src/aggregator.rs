// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired DNS state derived from Ingress objects.
//!
//! The [`IngressAggregator`] maps every Ingress identity (its UID) to the
//! [`DesiredRecord`]s derived from the latest observed revision of that Ingress.
//! It is written by the Ingress watcher through the [`IngressEventHandler`] trait
//! and read by the reconcile loop through [`IngressAggregator::dump`].
//!
//! # Concurrency
//!
//! Storage is a [`DashMap`], so `dump` can run while events are applied from
//! another task without external locking. Each write replaces one identity's
//! entry atomically; a dump is not a snapshot across identities.

use crate::address_set::AddressSet;
use crate::metrics;
use crate::notifier::ChangeNotifier;
use crate::records::{DesiredRecord, ObjectIdentity};
use dashmap::DashMap;
use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::debug;

/// Callbacks invoked by the Ingress watcher.
///
/// The watcher depends only on this trait, never on a concrete store.
pub trait IngressEventHandler: Send + Sync {
    /// A new Ingress was observed.
    fn on_add(&self, ingress: &Ingress);

    /// An already known Ingress changed. `old` is the previously observed revision.
    fn on_update(&self, old: &Ingress, new: &Ingress);

    /// An Ingress was removed from the cluster.
    fn on_delete(&self, ingress: &Ingress);
}

/// Identity under which an Ingress' records are stored.
///
/// Uses `metadata.uid`; objects without a UID (only seen in hand-built
/// fixtures) fall back to `namespace/name`.
#[must_use]
pub fn object_identity(ingress: &Ingress) -> ObjectIdentity {
    ingress.uid().unwrap_or_else(|| {
        format!(
            "{}/{}",
            ingress.namespace().unwrap_or_default(),
            ingress.name_any()
        )
    })
}

/// Derive one [`DesiredRecord`] per host rule, all sharing the Ingress'
/// load-balancer IP addresses.
///
/// Load-balancer entries exposing only a hostname contribute no address. A rule
/// without `host` yields a record with an empty domain.
#[must_use]
pub fn derive_records(ingress: &Ingress) -> Vec<DesiredRecord> {
    let addresses: AddressSet = ingress
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .into_iter()
        .flatten()
        .filter_map(|lb_ingress| lb_ingress.ip.clone())
        .collect();

    ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .into_iter()
        .flatten()
        .map(|rule| DesiredRecord {
            domain: rule.host.clone().unwrap_or_default(),
            addresses: addresses.clone(),
        })
        .collect()
}

/// Concurrent-safe store of desired records keyed by Ingress identity.
#[derive(Debug)]
pub struct IngressAggregator {
    current: DashMap<ObjectIdentity, Vec<DesiredRecord>>,
    notifier: Arc<ChangeNotifier>,
}

impl IngressAggregator {
    /// Create an empty aggregator signalling `notifier` on every change.
    #[must_use]
    pub fn new(notifier: Arc<ChangeNotifier>) -> Self {
        Self {
            current: DashMap::new(),
            notifier,
        }
    }

    /// Seed state from an initial listing before the watch stream is attached.
    ///
    /// Signals once at the end so the first reconciliation runs right away.
    pub fn preload(&self, ingresses: &[Ingress]) {
        for ingress in ingresses {
            self.store(ingress);
        }
        debug!(count = ingresses.len(), "Preloaded Ingresses");
        metrics::set_tracked_ingresses(self.current.len());
        self.notifier.signal();
    }

    /// Flattened copy of every stored record. Order across Ingresses is not meaningful.
    #[must_use]
    pub fn dump(&self) -> Vec<DesiredRecord> {
        self.current
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of tracked Ingresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// The change notifier shared with the reconcile loop.
    #[must_use]
    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    fn store(&self, ingress: &Ingress) {
        let identity = object_identity(ingress);
        let records = derive_records(ingress);
        debug!(
            identity = %identity,
            name = %ingress.name_any(),
            namespace = ?ingress.namespace(),
            records = records.len(),
            "Storing desired records"
        );
        self.current.insert(identity, records);
    }
}

impl IngressEventHandler for IngressAggregator {
    fn on_add(&self, ingress: &Ingress) {
        self.store(ingress);
        metrics::record_watch_event("add");
        metrics::set_tracked_ingresses(self.current.len());
        self.notifier.signal();
    }

    // Identity-keyed storage: the previous value is replaced, never diffed.
    fn on_update(&self, old: &Ingress, new: &Ingress) {
        let old_identity = object_identity(old);
        if old_identity != object_identity(new) {
            self.current.remove(&old_identity);
        }
        self.store(new);
        metrics::record_watch_event("update");
        metrics::set_tracked_ingresses(self.current.len());
        self.notifier.signal();
    }

    fn on_delete(&self, ingress: &Ingress) {
        let identity = object_identity(ingress);
        self.current.remove(&identity);
        debug!(identity = %identity, name = %ingress.name_any(), "Removed desired records");
        metrics::record_watch_event("delete");
        metrics::set_tracked_ingresses(self.current.len());
        self.notifier.signal();
    }
}

#[cfg(test)]
#[path = "aggregator_tests.rs"]
mod aggregator_tests;
