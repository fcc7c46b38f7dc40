// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Coalescing change notification between the Ingress watcher and the reconcile loop.
//!
//! [`ChangeNotifier`] holds at most one pending wakeup. Any burst of
//! [`ChangeNotifier::signal`] calls between two [`ChangeNotifier::wait`] calls
//! collapses into exactly one wakeup.

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Single-slot pending flag with a cancellable wait.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    // `Notify` stores at most one permit when nobody is waiting.
    notify: Notify,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a change as pending. Never blocks.
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    /// Wait for a pending change and consume it.
    ///
    /// Returns `true` when a wakeup was consumed and `false` when `cancel` fired first.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            () = self.notify.notified() => true,
        }
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod notifier_tests;
