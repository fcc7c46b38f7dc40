// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster-wide Ingress watch.
//!
//! This module connects the Kubernetes API to an [`IngressEventHandler`]:
//!
//! - [`preload_ingresses`] lists every Ingress once at startup, bounded by a deadline
//! - [`run_ingress_watcher`] follows the watch stream until cancelled
//!
//! The watch keeps a reflector [`Store`] of the last observed revision of every
//! Ingress, so it can tell additions from updates and hand the previous revision
//! to [`IngressEventHandler::on_update`]. When the watch re-lists (after a
//! disconnect or an expired resource version), objects that disappeared in the
//! meantime are reported through [`IngressEventHandler::on_delete`].
//!
//! Every resync interval all known Ingresses are redelivered as updates, which
//! forces a full reconciliation even when the cluster is quiet.

use crate::aggregator::{IngressAggregator, IngressEventHandler};
use crate::constants::KIND_INGRESS;
use crate::errors::PreloadError;
use anyhow::{bail, Result};
use futures::StreamExt;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, ListParams};
use kube::runtime::reflector::{self, store::Writer, ObjectRef, Store};
use kube::runtime::watcher::{self, Event};
use kube::runtime::WatchStreamExt;
use kube::ResourceExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Smallest resync period accepted; shorter values are raised to this.
const MIN_RESYNC_INTERVAL: Duration = Duration::from_secs(1);

/// List every Ingress and seed `aggregator` with them.
///
/// Returns the listed objects so the watch can start from the same state.
///
/// # Errors
///
/// Returns [`PreloadError::Timeout`] if the listing does not finish within
/// `timeout`, or [`PreloadError::ListFailed`] if the API call fails. Both are fatal.
pub async fn preload_ingresses(
    api: &Api<Ingress>,
    aggregator: &IngressAggregator,
    timeout: Duration,
) -> Result<Vec<Ingress>, PreloadError> {
    debug!(timeout = ?timeout, "Listing all Ingresses");

    let list = tokio::time::timeout(timeout, api.list(&ListParams::default()))
        .await
        .map_err(|_| PreloadError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })?
        .map_err(|e| PreloadError::ListFailed {
            reason: e.to_string(),
        })?;

    let ingresses = list.items;
    aggregator.preload(&ingresses);
    info!(count = ingresses.len(), "Preloaded {} objects", KIND_INGRESS);

    Ok(ingresses)
}

/// Translates raw watch events into [`IngressEventHandler`] calls.
pub struct EventDispatcher {
    handler: Arc<dyn IngressEventHandler>,
    reader: Store<Ingress>,
    writer: Writer<Ingress>,
    relisted: HashSet<ObjectRef<Ingress>>,
}

impl EventDispatcher {
    /// Create a dispatcher whose store already knows `seed`.
    ///
    /// Seeded objects are not reported to the handler; they were preloaded.
    pub fn new(handler: Arc<dyn IngressEventHandler>, seed: Vec<Ingress>) -> Self {
        let (reader, mut writer) = reflector::store();
        for ingress in seed {
            writer.apply_watcher_event(&Event::Apply(ingress));
        }

        Self {
            handler,
            reader,
            writer,
            relisted: HashSet::new(),
        }
    }

    /// Handle one watch event, then record it in the store.
    pub fn dispatch(&mut self, event: &Event<Ingress>) {
        match event {
            Event::Apply(ingress) => self.apply(ingress),
            Event::Delete(ingress) => {
                debug!(name = %ingress.name_any(), namespace = ?ingress.namespace(), "Ingress deleted");
                self.handler.on_delete(ingress);
            }
            Event::Init => {
                debug!("Ingress watch re-list started");
                self.relisted.clear();
            }
            Event::InitApply(ingress) => {
                self.relisted.insert(ObjectRef::from_obj(ingress));
                self.apply(ingress);
            }
            Event::InitDone => {
                // The store still holds the pre-relist state at this point.
                let vanished: Vec<Arc<Ingress>> = self
                    .reader
                    .state()
                    .into_iter()
                    .filter(|ingress| !self.relisted.contains(&ObjectRef::from_obj(ingress.as_ref())))
                    .collect();

                for ingress in &vanished {
                    debug!(name = %ingress.name_any(), "Ingress vanished during re-list");
                    self.handler.on_delete(ingress);
                }

                debug!(
                    listed = self.relisted.len(),
                    vanished = vanished.len(),
                    "Ingress watch re-list complete"
                );
                self.relisted.clear();
            }
        }

        self.writer.apply_watcher_event(event);
    }

    /// Redeliver every known Ingress as an update.
    pub fn resync(&self) {
        let known = self.reader.state();
        debug!(count = known.len(), "Resyncing Ingresses");
        for ingress in &known {
            self.handler.on_update(ingress, ingress);
        }
    }

    fn apply(&self, ingress: &Ingress) {
        match self.reader.get(&ObjectRef::from_obj(ingress)) {
            // Same name, different object: deleted and recreated while unobserved.
            Some(old) if old.uid() != ingress.uid() => {
                debug!(
                    name = %ingress.name_any(),
                    namespace = ?ingress.namespace(),
                    old_uid = ?old.uid(),
                    new_uid = ?ingress.uid(),
                    "Ingress recreated"
                );
                self.handler.on_delete(&old);
                self.handler.on_add(ingress);
            }
            Some(old) => {
                debug!(name = %ingress.name_any(), namespace = ?ingress.namespace(), "Ingress updated");
                self.handler.on_update(&old, ingress);
            }
            None => {
                debug!(name = %ingress.name_any(), namespace = ?ingress.namespace(), "Ingress added");
                self.handler.on_add(ingress);
            }
        }
    }
}

/// Follow the cluster-wide Ingress watch until `cancel` fires.
///
/// Watch errors are logged and retried with kube's default backoff.
///
/// # Errors
///
/// Returns an error if the watch stream terminates on its own.
pub async fn run_ingress_watcher(
    api: Api<Ingress>,
    handler: Arc<dyn IngressEventHandler>,
    seed: Vec<Ingress>,
    resync_interval: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    info!("Starting {} watcher", KIND_INGRESS);

    let mut dispatcher = EventDispatcher::new(handler, seed);
    let mut stream = watcher::watcher(api, watcher::Config::default())
        .default_backoff()
        .boxed();

    let period = resync_interval.max(MIN_RESYNC_INTERVAL);
    let mut resync = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    resync.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("{} watcher cancelled", KIND_INGRESS);
                return Ok(());
            }
            _ = resync.tick() => dispatcher.resync(),
            next = stream.next() => match next {
                Some(Ok(event)) => dispatcher.dispatch(&event),
                Some(Err(e)) => warn!(error = %e, "Ingress watch error, retrying"),
                None => bail!("{KIND_INGRESS} watch stream ended unexpectedly"),
            },
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod watcher_tests;
