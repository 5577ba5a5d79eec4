// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lifecycle guardian: process-lifecycle transitions to store/monitor actions.
//!
//! The crash-protection write on every `Paused`/`Hidden` transition is the
//! primary durability mechanism. `Detached` cleanup is secondary and
//! opportunistic: the OS grants limited execution time during teardown, so
//! the dispatch is synchronous and best-effort, never awaited on a future
//! tick.

use std::sync::Arc;

use crate::models::ActiveSessionSnapshot;
use crate::store::SessionStore;

/// Process lifecycle phases, mirroring the host's signal set.
/// `Detached` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Resumed,
    Inactive,
    Paused,
    Hidden,
    Detached,
}

/// The running session's own state holder, owned by the host.
pub trait SessionController: Send + Sync {
    /// Whether a session is currently being tracked.
    fn is_session_active(&self) -> bool;

    /// Current metrics as a persistable snapshot, if a session is active.
    fn current_snapshot(&self) -> Option<ActiveSessionSnapshot>;

    /// Seed a new running session from a recovered snapshot.
    fn seed_from_snapshot(&self, snapshot: ActiveSessionSnapshot);

    /// Emergency cleanup during process teardown. Must do its work
    /// synchronously; once this call returns the process may die.
    fn emergency_cleanup(&self) -> anyhow::Result<()>;
}

/// Non-session background work the guardian may pause while backgrounded
/// (e.g. a notification poller). Session tracking is never paused.
pub trait PausableWork: Send + Sync {
    fn pause(&self);
    fn resume(&self);
}

/// Translates OS lifecycle transitions into store actions.
pub struct LifecycleGuardian {
    store: Arc<SessionStore>,
    controller: Arc<dyn SessionController>,
    background: Vec<Arc<dyn PausableWork>>,
}

impl LifecycleGuardian {
    pub fn new(store: Arc<SessionStore>, controller: Arc<dyn SessionController>) -> Self {
        Self {
            store,
            controller,
            background: Vec::new(),
        }
    }

    /// Register non-session background work to pause on backgrounding.
    pub fn register_background_work(&mut self, work: Arc<dyn PausableWork>) {
        self.background.push(work);
    }

    /// Handle one lifecycle transition.
    pub fn handle(&self, phase: LifecyclePhase) {
        tracing::debug!(phase = ?phase, "Lifecycle transition");
        match phase {
            LifecyclePhase::Resumed => self.on_resumed(),
            // Transient (incoming call, app switcher): no store or monitor
            // action.
            LifecyclePhase::Inactive => {}
            LifecyclePhase::Paused | LifecyclePhase::Hidden => self.on_backgrounded(phase),
            LifecyclePhase::Detached => self.on_detached(),
        }
    }

    fn on_resumed(&self) {
        for work in &self.background {
            work.resume();
        }
        // The session itself never stopped; no recovery action needed.
        if self.controller.is_session_active() {
            tracing::info!("Resumed with active session; tracking continued throughout");
        }
    }

    fn on_backgrounded(&self, phase: LifecyclePhase) {
        if self.controller.is_session_active() {
            match self.controller.current_snapshot() {
                Some(snapshot) => {
                    let session_id = snapshot.session_id.clone();
                    self.store.save_snapshot(snapshot);
                    tracing::info!(
                        session_id = %session_id,
                        phase = ?phase,
                        "Crash-protection snapshot written on backgrounding"
                    );
                }
                None => {
                    tracing::warn!(
                        phase = ?phase,
                        "Active session reported no snapshot on backgrounding"
                    );
                }
            }
        }

        for work in &self.background {
            work.pause();
        }
    }

    fn on_detached(&self) {
        if !self.controller.is_session_active() {
            return;
        }
        tracing::warn!("Process detaching with active session; dispatching emergency cleanup");
        if let Err(e) = self.controller.emergency_cleanup() {
            // Unrecoverable once the process dies; the Paused-transition
            // write already covered durability.
            tracing::error!(error = %e, "Emergency cleanup dispatch failed");
        }
    }
}
