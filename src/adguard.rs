// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! AdGuard Home DNS rewrite API client.
//!
//! This module provides the [`RewriteStore`] abstraction used by the reconcile
//! loop and its HTTP implementation, [`AdGuardClient`]. It handles:
//!
//! - Listing every configured rewrite (`GET /control/rewrite/list`)
//! - Adding a single rewrite (`POST /control/rewrite/add`)
//! - Deleting a single rewrite (`POST /control/rewrite/delete`)
//!
//! All requests use HTTP basic authentication. Any transport error or non-200
//! response is reported as a [`RewriteError`]; callers do not distinguish causes.
//!
//! # Example
//!
//! ```rust,no_run
//! use kube_adguard_ingress::adguard::{AdGuardClient, AdGuardConfig, RewriteStore};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = AdGuardClient::new(&AdGuardConfig {
//!     url: "http://adguard.dns-system.svc:3000".to_string(),
//!     user: "admin".to_string(),
//!     password: "secret".to_string(),
//!     timeout: Duration::from_secs(5),
//! })?;
//!
//! let rewrites = client.list().await?;
//! # Ok(())
//! # }
//! ```

use crate::constants::{
    ADGUARD_REWRITE_ADD_PATH, ADGUARD_REWRITE_DELETE_PATH, ADGUARD_REWRITE_LIST_PATH,
};
use crate::errors::RewriteError;
use crate::records::RemoteRecord;
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// External DNS rewrite store.
#[async_trait]
pub trait RewriteStore: Send + Sync {
    /// Every rewrite row currently stored.
    async fn list(&self) -> Result<Vec<RemoteRecord>, RewriteError>;

    /// Create one rewrite row.
    async fn add(&self, record: &RemoteRecord) -> Result<(), RewriteError>;

    /// Delete one rewrite row.
    async fn delete(&self, record: &RemoteRecord) -> Result<(), RewriteError>;
}

/// Connection parameters for AdGuard Home.
#[derive(Clone)]
pub struct AdGuardConfig {
    /// Base URL, optionally with a path prefix (`http://host:3000/adguard`)
    pub url: String,
    pub user: String,
    pub password: String,
    /// Timeout applied to every single request
    pub timeout: Duration,
}

impl std::fmt::Debug for AdGuardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdGuardConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP client for the AdGuard Home rewrite API.
#[derive(Debug, Clone)]
pub struct AdGuardClient {
    client: HttpClient,
    base: Url,
    user: String,
    password: String,
}

/// Join `sub_path` onto the path of `base`, keeping any prefix.
///
/// `http://host/adguard/` + `/control/rewrite/list` gives
/// `http://host/adguard/control/rewrite/list`.
#[must_use]
pub fn build_api_url(base: &Url, sub_path: &str) -> String {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        sub_path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url.to_string()
}

impl AdGuardClient {
    /// Create a client from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the HTTP client cannot be built.
    pub fn new(config: &AdGuardConfig) -> Result<Self, RewriteError> {
        let base = Url::parse(&config.url).map_err(|e| RewriteError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        let client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RewriteError::ClientBuildFailed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base,
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL requests are built from.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// POST a single record to `path`, expecting HTTP 200.
    async fn post_record(
        &self,
        operation: &'static str,
        path: &str,
        record: &RemoteRecord,
    ) -> Result<(), RewriteError> {
        let url = build_api_url(&self.base, path);

        debug!(
            operation = operation,
            url = %url,
            domain = %record.domain,
            address = %record.address,
            "HTTP API request to AdGuard"
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(record)
            .send()
            .await
            .map_err(|e| RewriteError::RequestFailed {
                operation,
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(
                operation = operation,
                url = %url,
                status = %status,
                body = %body,
                "AdGuard API request failed"
            );
            return Err(RewriteError::UnexpectedStatus {
                operation,
                url,
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl RewriteStore for AdGuardClient {
    async fn list(&self) -> Result<Vec<RemoteRecord>, RewriteError> {
        const OPERATION: &str = "list";
        let url = build_api_url(&self.base, ADGUARD_REWRITE_LIST_PATH);

        debug!(url = %url, "Listing AdGuard rewrites");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|e| RewriteError::RequestFailed {
                operation: OPERATION,
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RewriteError::UnexpectedStatus {
                operation: OPERATION,
                url,
                status: status.as_u16(),
            });
        }

        // An empty rewrite table may be reported as `null`.
        let records: Vec<RemoteRecord> = response
            .json::<Option<Vec<RemoteRecord>>>()
            .await
            .map_err(|e| RewriteError::DecodeFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?
            .unwrap_or_default();

        debug!(url = %url, count = records.len(), "Listed AdGuard rewrites");
        Ok(records)
    }

    async fn add(&self, record: &RemoteRecord) -> Result<(), RewriteError> {
        self.post_record("add", ADGUARD_REWRITE_ADD_PATH, record)
            .await
    }

    async fn delete(&self, record: &RemoteRecord) -> Result<(), RewriteError> {
        self.post_record("delete", ADGUARD_REWRITE_DELETE_PATH, record)
            .await
    }
}

#[cfg(test)]
#[path = "adguard_tests.rs"]
mod adguard_tests;
