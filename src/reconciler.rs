// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation loop pushing the desired state into AdGuard Home.
//!
//! Each cycle runs through:
//!
//! 1. **Wait** for a pending change (or cancellation)
//! 2. **Fetch** the current rewrites and the static overrides
//! 3. **Diff** them against [`IngressAggregator::dump`]
//! 4. **Apply** every addition, then every removal
//! 5. **Cool down** for the throttle duration
//!
//! A failed fetch abandons the cycle and goes straight back to waiting. A failed
//! add or delete is logged and counted; the rest of the batch still runs and
//! nothing is retried until the next change arrives.

use crate::adguard::RewriteStore;
use crate::aggregator::IngressAggregator;
use crate::diff::diff;
use crate::errors::CycleError;
use crate::metrics;
use crate::records::RemoteRecord;
use crate::static_records::StaticRecordSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything a reconciliation cycle needs.
#[derive(Clone)]
pub struct Context {
    /// AdGuard rewrite API
    pub store: Arc<dyn RewriteStore>,
    /// Static overrides
    pub statics: Arc<dyn StaticRecordSource>,
    /// Desired state built from Ingresses; its notifier wakes the loop
    pub aggregator: Arc<IngressAggregator>,
    /// Minimum pause between two cycles
    pub throttle: Duration,
}

/// Outcome of one applied cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub added: usize,
    pub removed: usize,
    pub failed: usize,
    pub static_count: usize,
}

impl CycleReport {
    /// `true` when the cycle had nothing to do.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.failed == 0
    }
}

/// Run one fetch, diff and apply pass.
///
/// # Errors
///
/// Returns a [`CycleError`] when the remote rewrites or the static overrides
/// cannot be fetched. Individual add/delete failures are not errors; they are
/// counted in [`CycleReport::failed`].
pub async fn reconcile_once(ctx: &Context) -> Result<CycleReport, CycleError> {
    let remote = ctx.store.list().await.map_err(CycleError::ListRemote)?;
    let statics = ctx.statics.load().await.map_err(CycleError::LoadStatic)?;
    let desired = ctx.aggregator.dump();

    debug!(
        remote = remote.len(),
        desired = desired.len(),
        statics = statics.len(),
        "Computing rewrite diff"
    );

    let changes = diff(&remote, &desired, &statics);
    let mut report = CycleReport {
        static_count: statics.len(),
        ..CycleReport::default()
    };

    for record in &changes.to_add {
        if apply(ctx.store.as_ref(), Operation::Add, record).await {
            report.added += 1;
        } else {
            report.failed += 1;
        }
    }

    for record in &changes.to_remove {
        if apply(ctx.store.as_ref(), Operation::Delete, record).await {
            report.removed += 1;
        } else {
            report.failed += 1;
        }
    }

    Ok(report)
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Add,
    Delete,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Delete => "delete",
        }
    }
}

async fn apply(store: &dyn RewriteStore, operation: Operation, record: &RemoteRecord) -> bool {
    let result = match operation {
        Operation::Add => store.add(record).await,
        Operation::Delete => store.delete(record).await,
    };

    match result {
        Ok(()) => {
            info!(
                operation = operation.as_str(),
                domain = %record.domain,
                address = %record.address,
                "Applied rewrite"
            );
            metrics::record_operation(operation.as_str(), true);
            true
        }
        Err(e) => {
            error!(
                operation = operation.as_str(),
                domain = %record.domain,
                address = %record.address,
                error = %e,
                "Failed to apply rewrite"
            );
            metrics::record_operation(operation.as_str(), false);
            false
        }
    }
}

/// Wait for changes and reconcile until `cancel` fires.
///
/// Cancellation is a clean exit, at any point of the cycle.
pub async fn run_reconcile_loop(ctx: Context, cancel: CancellationToken) {
    info!(throttle = ?ctx.throttle, "Starting reconcile loop");

    loop {
        if !ctx.aggregator.notifier().wait(&cancel).await {
            break;
        }

        let started = Instant::now();
        let outcome = tokio::select! {
            () = cancel.cancelled() => break,
            outcome = reconcile_once(&ctx) => outcome,
        };

        match outcome {
            Ok(report) => {
                metrics::record_reconciliation_success(started.elapsed());
                if report.is_noop() {
                    debug!(statics = report.static_count, "Rewrites already up to date");
                } else {
                    info!(
                        added = report.added,
                        removed = report.removed,
                        failed = report.failed,
                        statics = report.static_count,
                        "Reconciliation cycle complete"
                    );
                }
            }
            Err(e) => {
                metrics::record_reconciliation_error(e.kind(), started.elapsed());
                warn!(error = %e, "Reconciliation cycle abandoned");
                continue;
            }
        }

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(ctx.throttle) => {}
        }
    }

    info!("Reconcile loop stopped");
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
