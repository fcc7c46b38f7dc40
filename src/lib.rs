// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # kube-adguard-ingress - Kubernetes Ingress to AdGuard Home DNS rewrites
//!
//! Watches every `networking.k8s.io/v1` Ingress in the cluster and keeps the
//! DNS rewrite table of an AdGuard Home instance in sync with the hosts they
//! declare and the load-balancer IPs they were assigned.
//!
//! ## Overview
//!
//! - The Ingress watcher feeds an [`aggregator::IngressAggregator`] holding the
//!   desired records of every Ingress, keyed by UID
//! - Each change wakes the reconcile loop through a coalescing
//!   [`notifier::ChangeNotifier`]
//! - The loop lists the current rewrites, computes a [`diff::diff`] against the
//!   desired state and the static overrides, then adds and deletes rewrites
//!
//! Static overrides from a YAML file are additive: they create rewrites and
//! protect their domains from removal, but never remove anything.
//!
//! ## Modules
//!
//! - [`address_set`] - Unordered address set with sorted output
//! - [`records`] - Desired, remote and static record types
//! - [`aggregator`] - Desired state derived from Ingresses
//! - [`notifier`] - Coalescing change notification
//! - [`diff`] - Pure reconciliation engine
//! - [`adguard`] - AdGuard Home rewrite API client
//! - [`static_records`] - Cached static overrides
//! - [`watcher`] - Ingress preload and watch
//! - [`reconciler`] - Throttled reconcile loop
//! - [`config`] - Command line and environment configuration
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use kube_adguard_ingress::diff::diff;
//! use kube_adguard_ingress::records::{DesiredRecord, RemoteRecord};
//!
//! let desired = vec![DesiredRecord {
//!     domain: "app.example.com".to_string(),
//!     addresses: ["10.0.0.1"].into_iter().collect(),
//! }];
//! let remote = vec![RemoteRecord::new("old.example.com", "10.0.0.9")];
//!
//! let changes = diff(&remote, &desired, &[]);
//! assert_eq!(changes.to_add, vec![RemoteRecord::new("app.example.com", "10.0.0.1")]);
//! assert_eq!(changes.to_remove, vec![RemoteRecord::new("old.example.com", "10.0.0.9")]);
//! ```

pub mod address_set;
pub mod adguard;
pub mod aggregator;
pub mod config;
pub mod constants;
pub mod diff;
pub mod duration;
pub mod errors;
pub mod metrics;
pub mod notifier;
pub mod reconciler;
pub mod records;
pub mod static_records;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_fixtures;
