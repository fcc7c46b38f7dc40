// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the ingress-to-AdGuard operator.
//!
//! This module provides specialized error types for:
//! - AdGuard Home rewrite API operations
//! - Loading the static override file
//! - The initial Ingress listing performed at startup
//! - A single reconciliation cycle
//!
//! Only [`PreloadError`] is fatal. Every other error is logged by the reconcile
//! loop, which keeps running and self-corrects on the next successful cycle.

use thiserror::Error;

/// Errors returned by the AdGuard Home rewrite API client.
///
/// The reconcile loop does not distinguish between variants; they exist so logs
/// carry enough context to diagnose the failure.
#[derive(Error, Debug, Clone)]
pub enum RewriteError {
    /// The configured AdGuard URL could not be parsed
    #[error("Invalid AdGuard URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as configured
        url: String,
        /// Parser error message
        reason: String,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {reason}")]
    ClientBuildFailed {
        /// Builder error message
        reason: String,
    },

    /// Transport failure (connection refused, DNS failure, timeout, ...)
    #[error("{operation} request to {url} failed: {reason}")]
    RequestFailed {
        /// Logical operation (`list`, `add`, `delete`)
        operation: &'static str,
        /// Full request URL
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// AdGuard answered with a non-success status code
    #[error("{operation} request to {url} returned HTTP {status}")]
    UnexpectedStatus {
        /// Logical operation (`list`, `add`, `delete`)
        operation: &'static str,
        /// Full request URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The rewrite listing could not be decoded
    #[error("Failed to decode rewrite list from {url}: {reason}")]
    DecodeFailed {
        /// Full request URL
        url: String,
        /// Decoder error message
        reason: String,
    },
}

/// Errors returned while loading the static override file.
#[derive(Error, Debug, Clone)]
pub enum StaticError {
    /// The file could not be read
    #[error("Failed to read static records file '{path}': {reason}")]
    ReadFailed {
        /// Path of the static file
        path: String,
        /// I/O error message
        reason: String,
    },

    /// The file content is not a valid YAML list of records
    #[error("Failed to parse static records file '{path}': {reason}")]
    ParseFailed {
        /// Path of the static file
        path: String,
        /// YAML error message
        reason: String,
    },
}

/// Errors raised by the initial Ingress listing. Always fatal.
#[derive(Error, Debug, Clone)]
pub enum PreloadError {
    /// The listing did not complete before the configured deadline
    #[error("Initial Ingress listing did not complete within {timeout_ms}ms")]
    Timeout {
        /// Configured deadline in milliseconds
        timeout_ms: u64,
    },

    /// The Kubernetes API rejected or failed the listing
    #[error("Failed to list Ingresses: {reason}")]
    ListFailed {
        /// Kubernetes client error message
        reason: String,
    },
}

/// Errors abandoning a reconciliation cycle before anything was applied.
#[derive(Error, Debug, Clone)]
pub enum CycleError {
    /// Listing the current AdGuard rewrites failed
    #[error("failed to list current rewrites: {0}")]
    ListRemote(#[source] RewriteError),

    /// Loading the static overrides failed
    #[error("failed to load static records: {0}")]
    LoadStatic(#[source] StaticError),
}

impl CycleError {
    /// Short label used for metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::ListRemote(_) => "list_remote",
            CycleError::LoadStatic(_) => "load_static",
        }
    }
}
