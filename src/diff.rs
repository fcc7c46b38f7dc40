// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation engine: computes the rewrites to add and remove so that
//! AdGuard converges toward the desired state.
//!
//! # Algorithm
//!
//! 1. Index remote rows by domain (duplicate rows collapse).
//! 2. Index desired records by domain, unioning addresses across Ingresses.
//! 3. Union static records into the desired index, creating domains as needed.
//! 4. For every desired domain: missing addresses are added, extra ones removed.
//! 5. Every remote domain absent from the desired index is removed entirely.
//!
//! Static-only domains are part of the desired index, so step 5 never purges them.
//!
//! The function is pure. Output is sorted for readable logs; callers should treat
//! both lists as sets.

use crate::address_set::AddressSet;
use crate::records::{DesiredRecord, RemoteRecord, StaticRecord};
use std::collections::HashMap;

/// Operations needed to converge the remote store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDiff {
    pub to_remove: Vec<RemoteRecord>,
    pub to_add: Vec<RemoteRecord>,
}

impl RecordDiff {
    /// `true` when the remote store already matches the desired state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

fn rows(domain: &str, addresses: AddressSet) -> impl Iterator<Item = RemoteRecord> + '_ {
    addresses
        .into_iter()
        .map(move |address| RemoteRecord::new(domain, address))
}

/// Compute the rewrites to add and remove.
///
/// # Arguments
/// * `remote` - Rows currently stored in AdGuard
/// * `desired` - Records derived from Ingresses (see [`crate::aggregator::IngressAggregator::dump`])
/// * `statics` - Operator-supplied overrides; they only ever add
#[must_use]
pub fn diff(
    remote: &[RemoteRecord],
    desired: &[DesiredRecord],
    statics: &[StaticRecord],
) -> RecordDiff {
    let mut remote_by_domain: HashMap<&str, AddressSet> = HashMap::new();
    for record in remote {
        remote_by_domain
            .entry(record.domain.as_str())
            .or_default()
            .insert(record.address.as_str());
    }

    let mut cluster_by_domain: HashMap<&str, AddressSet> = HashMap::new();
    for record in desired {
        cluster_by_domain
            .entry(record.domain.as_str())
            .or_default()
            .extend_from(&record.addresses);
    }

    for record in statics {
        cluster_by_domain
            .entry(record.domain.as_str())
            .or_default()
            .extend(record.address.iter().map(String::as_str));
    }

    let empty = AddressSet::new();
    let mut result = RecordDiff::default();

    for (domain, want) in &cluster_by_domain {
        let have = remote_by_domain.get(domain).unwrap_or(&empty);
        result.to_add.extend(rows(domain, want.without(have)));
        result.to_remove.extend(rows(domain, have.without(want)));
    }

    // Domains backed by neither an Ingress nor a static record.
    for (domain, have) in remote_by_domain {
        if cluster_by_domain.contains_key(domain) {
            continue;
        }
        result.to_remove.extend(rows(domain, have));
    }

    result.to_add.sort();
    result.to_remove.sort();
    result
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod diff_tests;
