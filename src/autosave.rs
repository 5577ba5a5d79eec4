// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic snapshot autosave.
//!
//! Pulls current metrics from the session controller on a fixed cadence and
//! writes them through the store while a session is active. The lifecycle
//! guardian's forced write on backgrounding is independent of this cadence.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::lifecycle::SessionController;
use crate::store::SessionStore;

/// Periodic autosave task.
pub struct Autosaver {
    store: Arc<SessionStore>,
    controller: Arc<dyn SessionController>,
    interval: Duration,
    running: Mutex<Option<CancellationToken>>,
}

impl Autosaver {
    pub fn new(
        store: Arc<SessionStore>,
        controller: Arc<dyn SessionController>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            controller,
            interval: config.autosave_interval,
            running: Mutex::new(None),
        }
    }

    /// Start the autosave loop. Idempotent.
    ///
    /// The first tick fires immediately, which doubles as the session-start
    /// write when a session is already active.
    pub fn start(&self) {
        let mut running = self.running.lock().expect("running lock poisoned");
        if running.is_some() {
            tracing::debug!("Autosaver already running");
            return;
        }

        let cancel = CancellationToken::new();
        *running = Some(cancel.clone());

        let store = self.store.clone();
        let controller = self.controller.clone();
        let period = self.interval;

        tokio::spawn(async move {
            tracing::info!(period_secs = period.as_secs(), "Autosaver started");
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Autosaver stopping");
                        break;
                    }
                    _ = interval.tick() => {
                        autosave_tick(&store, controller.as_ref());
                    }
                }
            }
        });
    }

    /// Stop the autosave loop. Idempotent.
    pub fn stop(&self) {
        if let Some(cancel) = self.running.lock().expect("running lock poisoned").take() {
            cancel.cancel();
        }
    }
}

fn autosave_tick(store: &SessionStore, controller: &dyn SessionController) {
    if !controller.is_session_active() {
        return;
    }
    match controller.current_snapshot() {
        Some(snapshot) => store.save_snapshot(snapshot),
        None => tracing::warn!("Active session reported no snapshot at autosave"),
    }
}
