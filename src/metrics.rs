// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the ingress-to-AdGuard operator.
//!
//! This module provides metrics collection with the namespace prefix
//! `kube_adguard_ingress_`, and the optional HTTP server exposing them.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Track reconciliation cycles and their outcomes
//! - **Record Metrics** - Track individual rewrite add/delete calls
//! - **Watch Metrics** - Track Ingress events and the number of tracked Ingresses
//!
//! # Example
//!
//! ```rust,no_run
//! use kube_adguard_ingress::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success(std::time::Duration::from_secs(1));
//! ```

use crate::constants::{HEALTH_SERVER_PATH, METRICS_NAMESPACE, METRICS_SERVER_PATH};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::net::SocketAddr;
use std::sync::LazyLock;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliation cycles by outcome
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliation cycles by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliation cycles in seconds (fetch, diff and apply)
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliation cycles in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of abandoned cycles by cause
///
/// Labels:
/// - `error_type`: Cause (`list_remote`, `load_static`)
pub static CYCLE_ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_cycle_errors_total"),
        "Total number of abandoned reconciliation cycles by cause",
    );
    let counter = CounterVec::new(opts, &["error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Record Metrics
// ============================================================================

/// Total number of rewrite operations sent to AdGuard
///
/// Labels:
/// - `operation`: `add` or `delete`
/// - `status`: `success` or `error`
pub static RECORD_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_record_operations_total"),
        "Total number of rewrite operations by operation and status",
    );
    let counter = CounterVec::new(opts, &["operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Watch Metrics
// ============================================================================

/// Total number of Ingress events handled
///
/// Labels:
/// - `event`: `add`, `update` or `delete`
pub static WATCH_EVENTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_watch_events_total"),
        "Total number of Ingress events by type",
    );
    let counter = CounterVec::new(opts, &["event"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Number of Ingresses currently contributing desired records
pub static TRACKED_INGRESSES: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        format!("{METRICS_NAMESPACE}_tracked_ingresses"),
        "Number of Ingresses currently tracked",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a completed reconciliation cycle
pub fn record_reconciliation_success(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["success"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record an abandoned reconciliation cycle
///
/// # Arguments
/// * `error_type` - Cause of the failure (see [`crate::errors::CycleError::kind`])
/// * `duration` - Time spent before the cycle was abandoned
pub fn record_reconciliation_error(error_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["error"]).inc();
    CYCLE_ERRORS_TOTAL.with_label_values(&[error_type]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a single rewrite add/delete call
///
/// # Arguments
/// * `operation` - `add` or `delete`
/// * `success` - Whether AdGuard accepted the call
pub fn record_operation(operation: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    RECORD_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}

/// Record a handled Ingress event
pub fn record_watch_event(event: &str) {
    WATCH_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

/// Publish the current number of tracked Ingresses
#[allow(clippy::cast_precision_loss)]
pub fn set_tracked_ingresses(count: usize) {
    TRACKED_INGRESSES.set(count as f64);
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn metrics_handler() -> impl IntoResponse {
    match gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Router serving `/metrics` and `/healthz`
pub fn metrics_router() -> Router {
    Router::new()
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .route(HEALTH_SERVER_PATH, get(health_handler))
}

/// Serve metrics on `addr` until `cancel` fires.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve_metrics(addr: SocketAddr, cancel: CancellationToken) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Serving metrics");

    axum::serve(listener, metrics_router())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("Metrics server stopped");
    Ok(())
}
