// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the ingress-to-AdGuard operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Kubernetes Constants
// ============================================================================

/// Kind name of the only tracked resource
pub const KIND_INGRESS: &str = "Ingress";

// ============================================================================
// AdGuard API Constants
// ============================================================================

/// Path listing every configured DNS rewrite
pub const ADGUARD_REWRITE_LIST_PATH: &str = "/control/rewrite/list";

/// Path adding a single DNS rewrite
pub const ADGUARD_REWRITE_ADD_PATH: &str = "/control/rewrite/add";

/// Path deleting a single DNS rewrite
pub const ADGUARD_REWRITE_DELETE_PATH: &str = "/control/rewrite/delete";

// ============================================================================
// Default Intervals
// ============================================================================

/// Minimal interval between two reconciliation cycles
pub const DEFAULT_THROTTLE: &str = "3s";

/// Interval at which the watcher forces a full reconciliation
pub const DEFAULT_SYNC_INTERVAL: &str = "1m";

/// Deadline for the initial Ingress listing
pub const DEFAULT_PRELOAD_TIMEOUT: &str = "10s";

/// Timeout of a single AdGuard HTTP request
pub const DEFAULT_ADGUARD_TIMEOUT: &str = "5s";

/// Lifetime of the cached static record file
pub const DEFAULT_STATIC_TTL: &str = "5s";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of tokio worker threads
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Name given to tokio worker threads
pub const TOKIO_THREAD_NAME: &str = "adguard-ingress";

// ============================================================================
// Metrics Constants
// ============================================================================

/// Namespace prefix for all exported metrics (prometheus-safe)
pub const METRICS_NAMESPACE: &str = "kube_adguard_ingress";

/// HTTP path serving Prometheus metrics
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// HTTP path serving the liveness probe
pub const HEALTH_SERVER_PATH: &str = "/healthz";
