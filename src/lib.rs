// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session continuity and recovery engine for ruck tracking.
//!
//! Keeps a long-running outdoor session alive across process death, GPS
//! subsystem stalls and OS power-management throttling: durable snapshot
//! persistence, GPS-health watchdogs, lifecycle-driven crash protection,
//! and an offline completion queue for sessions finished without
//! connectivity.

pub mod autosave;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod location;
pub mod models;
pub mod store;
pub mod sync;
pub mod time_utils;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use autosave::Autosaver;
use cleanup::CleanupScheduler;
use config::EngineConfig;
use error::Result;
use lifecycle::{LifecycleGuardian, LifecyclePhase, SessionController};
use location::{LocationProvider, PositionMonitor};
use models::{ActiveSessionSnapshot, LocationFix};
use store::{KeyValueStore, SessionStore};
use sync::OfflineReconciler;

/// Composition root for the continuity engine.
///
/// Explicitly constructed and dependency-injected; the process entry point
/// owns its lifetime through [`SessionEngine::init`] and
/// [`SessionEngine::shutdown`].
pub struct SessionEngine {
    config: EngineConfig,
    store: Arc<SessionStore>,
    monitor: Arc<PositionMonitor>,
    guardian: LifecycleGuardian,
    cleanup: CleanupScheduler,
    autosaver: Autosaver,
    reconciler: OfflineReconciler,
    controller: Arc<dyn SessionController>,
}

impl SessionEngine {
    /// Wire the engine and start its background tasks (cleanup sweep,
    /// autosave loop). Must run inside a tokio runtime.
    pub fn init(
        config: EngineConfig,
        kv: Arc<dyn KeyValueStore>,
        provider: Arc<dyn LocationProvider>,
        controller: Arc<dyn SessionController>,
    ) -> Self {
        let store = Arc::new(SessionStore::new(kv, &config));
        let monitor = Arc::new(PositionMonitor::new(provider, &config));
        let guardian = LifecycleGuardian::new(store.clone(), controller.clone());
        let cleanup = CleanupScheduler::new(store.clone(), &config);
        let autosaver = Autosaver::new(store.clone(), controller.clone(), &config);
        let reconciler = OfflineReconciler::new(store.clone());

        cleanup.start();
        autosaver.start();
        tracing::info!("Session continuity engine initialized");

        Self {
            config,
            store,
            monitor,
            guardian,
            cleanup,
            autosaver,
            reconciler,
            controller,
        }
    }

    /// Stop background tasks and tracking. Idempotent.
    pub fn shutdown(&self) {
        self.autosaver.stop();
        self.cleanup.stop();
        self.monitor.stop_tracking();
        tracing::info!("Session continuity engine shut down");
    }

    // ─── Recovery ────────────────────────────────────────────────

    /// The "should I recover?" decision for the surrounding UI layer.
    ///
    /// Returns the stored snapshot iff one exists and its last save is
    /// within the recovery window; otherwise `None` and the session starts
    /// fresh.
    pub fn check_recovery(&self) -> Option<ActiveSessionSnapshot> {
        if !self.store.is_recovery_eligible() {
            if self.store.has_active_snapshot() {
                tracing::info!("Snapshot present but outside recovery window; not offering");
            }
            return None;
        }
        self.store.load_snapshot()
    }

    /// Seed the running session from a recovered snapshot.
    pub fn resume_from(&self, snapshot: ActiveSessionSnapshot) {
        tracing::info!(
            session_id = %snapshot.session_id,
            fixes = snapshot.route.len(),
            "Resuming session from recovered snapshot"
        );
        self.controller.seed_from_snapshot(snapshot);
    }

    /// Discard a recoverable snapshot the user declined.
    pub fn discard_recovery(&self) {
        self.store.clear_snapshot();
    }

    // ─── Tracking ────────────────────────────────────────────────

    /// Start the location stream at the configured sampling interval.
    pub async fn start_tracking(&self) -> Result<mpsc::Receiver<LocationFix>> {
        let rx = self
            .monitor
            .start_tracking(self.config.min_fix_interval)
            .await?;
        Ok(rx)
    }

    /// Start the location stream at an explicit sampling interval.
    pub async fn start_tracking_with_interval(
        &self,
        min_interval: Duration,
    ) -> Result<mpsc::Receiver<LocationFix>> {
        let rx = self.monitor.start_tracking(min_interval).await?;
        Ok(rx)
    }

    /// Stop the location stream. Idempotent.
    pub fn stop_tracking(&self) {
        self.monitor.stop_tracking();
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Forward one OS lifecycle transition to the guardian.
    pub fn handle_lifecycle(&self, phase: LifecyclePhase) {
        self.guardian.handle(phase);
    }

    /// Guardian access for registering pausable background work.
    pub fn guardian_mut(&mut self) -> &mut LifecycleGuardian {
        &mut self.guardian
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn monitor(&self) -> &Arc<PositionMonitor> {
        &self.monitor
    }

    pub fn cleanup(&self) -> &CleanupScheduler {
        &self.cleanup
    }

    pub fn reconciler(&self) -> &OfflineReconciler {
        &self.reconciler
    }
}
