// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic cleanup of stale session state.
//!
//! Hourly sweep: discard an active snapshot whose last save is past the
//! retention threshold, then prune synced offline completions. The retention
//! threshold (12 h) is deliberately larger than the recovery window (6 h): a
//! snapshot stays visible for inspection after it is no longer offered for
//! resumption.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::store::SessionStore;

/// Fixed-period background sweep over the local state store.
pub struct CleanupScheduler {
    store: Arc<SessionStore>,
    snapshot_retention: chrono::Duration,
    sweep_interval: Duration,
    running: Mutex<Option<CancellationToken>>,
}

impl CleanupScheduler {
    pub fn new(store: Arc<SessionStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            snapshot_retention: chrono::Duration::from_std(config.snapshot_retention)
                .unwrap_or_else(|_| chrono::Duration::hours(12)),
            sweep_interval: config.sweep_interval,
            running: Mutex::new(None),
        }
    }

    /// Start the sweep loop. Runs once immediately, then on the fixed
    /// period. Idempotent: a second start while running is a no-op.
    pub fn start(&self) {
        let mut running = self.running.lock().expect("running lock poisoned");
        if running.is_some() {
            tracing::debug!("Cleanup scheduler already running");
            return;
        }

        let cancel = CancellationToken::new();
        *running = Some(cancel.clone());

        let store = self.store.clone();
        let retention = self.snapshot_retention;
        let period = self.sweep_interval;

        tokio::spawn(async move {
            tracing::info!(period_secs = period.as_secs(), "Cleanup scheduler started");
            // First tick completes immediately.
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Cleanup scheduler stopping");
                        break;
                    }
                    _ = interval.tick() => {
                        sweep(&store, retention);
                    }
                }
            }
        });
    }

    /// Stop the sweep loop. Idempotent.
    pub fn stop(&self) {
        if let Some(cancel) = self.running.lock().expect("running lock poisoned").take() {
            cancel.cancel();
        }
    }

    /// Run one sweep synchronously, outside the periodic loop.
    pub fn sweep_once(&self) {
        sweep(&self.store, self.snapshot_retention);
    }
}

fn sweep(store: &SessionStore, retention: chrono::Duration) {
    if let Some(saved_at) = store.last_save_at() {
        let age = Utc::now().signed_duration_since(saved_at);
        if age >= retention {
            tracing::info!(
                age_hours = age.num_hours(),
                retention_hours = retention.num_hours(),
                "Active snapshot past retention; clearing"
            );
            store.clear_snapshot();
        } else {
            tracing::debug!(age_hours = age.num_hours(), "Active snapshot within retention");
        }
    }

    store.prune_synced_offline_completions();
}
