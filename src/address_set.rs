// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deduplicated, order-irrelevant collection of address strings.
//!
//! [`AddressSet`] stores addresses without any ordering, but every externally
//! observable rendering (serialization, `Display`, [`AddressSet::to_sorted_vec`])
//! is sorted so logs and payloads are deterministic.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Set of addresses (IPs or hostnames) with sorted external representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet {
    items: HashSet<String>,
}

impl AddressSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single address. Returns `true` if it was not present yet.
    pub fn insert(&mut self, address: impl Into<String>) -> bool {
        self.items.insert(address.into())
    }

    /// Union `other` into this set in place.
    pub fn extend_from(&mut self, other: &AddressSet) {
        self.items.extend(other.items.iter().cloned());
    }

    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.items.contains(address)
    }

    /// Addresses present in `self` but not in `other`.
    #[must_use]
    pub fn without(&self, other: &AddressSet) -> AddressSet {
        self.items
            .iter()
            .filter(|address| !other.contains(address))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over addresses in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Addresses sorted lexicographically.
    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut sorted: Vec<String> = self.items.iter().cloned().collect();
        sorted.sort();
        sorted
    }
}

impl<S: Into<String>> FromIterator<S> for AddressSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for AddressSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.items.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for AddressSet {
    type Item = String;
    type IntoIter = std::collections::hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_sorted_vec().join(", "))
    }
}

impl Serialize for AddressSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_sorted_vec().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AddressSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<String>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "address_set_tests.rs"]
mod address_set_tests;
