// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Static DNS overrides loaded from a YAML file.
//!
//! The file is a list of domains with the addresses they should always resolve to:
//!
//! ```yaml
//! - domain: nas.home.example
//!   address:
//!     - 192.168.1.10
//! - domain: printer.home.example
//!   address:
//!     - 192.168.1.20
//! ```
//!
//! The parsed content is cached for a configurable TTL. When the cache is stale
//! the file is re-read; a read or parse error is returned to the caller and the
//! stale content is not reused.

use crate::errors::StaticError;
use crate::records::StaticRecord;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Source of operator-supplied static records.
#[async_trait]
pub trait StaticRecordSource: Send + Sync {
    /// Current static records.
    async fn load(&self) -> Result<Vec<StaticRecord>, StaticError>;
}

#[derive(Debug, Default)]
struct CachedRecords {
    records: Vec<StaticRecord>,
    loaded_at: Option<Instant>,
}

impl CachedRecords {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.is_some_and(|at| at.elapsed() <= ttl)
    }
}

/// Time-cached YAML file of static records.
#[derive(Debug)]
pub struct StaticFile {
    path: Option<PathBuf>,
    ttl: Duration,
    cache: RwLock<CachedRecords>,
}

impl StaticFile {
    /// Create a source for `path`. Without a path every load returns no records.
    #[must_use]
    pub fn new(path: Option<PathBuf>, ttl: Duration) -> Self {
        Self {
            path,
            ttl,
            cache: RwLock::new(CachedRecords::default()),
        }
    }

    async fn read_file(path: &PathBuf) -> Result<Vec<StaticRecord>, StaticError> {
        let path_str = path.display().to_string();

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StaticError::ReadFailed {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        // A document holding only comments parses as `null`.
        let records: Option<Vec<StaticRecord>> =
            serde_yaml::from_str(&content).map_err(|e| StaticError::ParseFailed {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;

        let records = records.unwrap_or_default();
        debug!(path = %path_str, count = records.len(), "Loaded static records");
        Ok(records)
    }
}

#[async_trait]
impl StaticRecordSource for StaticFile {
    async fn load(&self) -> Result<Vec<StaticRecord>, StaticError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(Vec::new());
        };

        {
            let cache = self.cache.read().await;
            if cache.is_fresh(self.ttl) {
                return Ok(cache.records.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another caller may have refreshed while we waited for the write lock.
        if cache.is_fresh(self.ttl) {
            return Ok(cache.records.clone());
        }

        let records = Self::read_file(path).await?;
        cache.records.clone_from(&records);
        cache.loaded_at = Some(Instant::now());
        Ok(records)
    }
}

#[cfg(test)]
#[path = "static_records_tests.rs"]
mod static_records_tests;
