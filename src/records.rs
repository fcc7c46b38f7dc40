// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record types shared by the aggregator, the diff engine and the collaborators.
//!
//! - [`DesiredRecord`] - one host rule of an Ingress with the Ingress' addresses
//! - [`RemoteRecord`] - one AdGuard rewrite row (`domain` -> `answer`)
//! - [`StaticRecord`] - operator-supplied override, additive only

use crate::address_set::AddressSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a tracked cluster object (its UID).
pub type ObjectIdentity = String;

/// Domain derived from a cluster object together with the addresses it should resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecord {
    pub domain: String,
    pub addresses: AddressSet,
}

/// A single rewrite row as stored by AdGuard Home.
///
/// AdGuard names the target field `answer`; it is exposed here as `address`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub domain: String,
    #[serde(rename = "answer")]
    pub address: String,
}

impl RemoteRecord {
    #[must_use]
    pub fn new(domain: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for RemoteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.domain, self.address)
    }
}

/// Statically configured domain with the addresses it should always resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRecord {
    pub domain: String,
    #[serde(default)]
    pub address: Vec<String>,
}
