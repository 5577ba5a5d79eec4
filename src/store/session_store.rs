// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable store for the active-session snapshot and the offline queue.
//!
//! Every operation that touches storage catches and logs faults instead of
//! propagating them: a throw here would crash the session-tracking loop that
//! is the app's core value. Reads degrade to "no data", writes to "best
//! effort, continue".

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineConfig;
use crate::models::{ActiveSessionSnapshot, OfflineCompletedSession};
use crate::store::keys;
use crate::store::kv::KeyValueStore;
use crate::time_utils;

/// Local state store for one active snapshot plus offline completions.
///
/// All snapshot writers (periodic autosave, forced lifecycle save, recovery
/// write-back) serialize through the single snapshot key; last writer wins.
/// Queue mutations are read-modify-write over the whole queue and are made
/// mutually exclusive by `queue_lock`.
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    recovery_window: Duration,
    offline_retention: Duration,
    queue_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &EngineConfig) -> Self {
        Self {
            kv,
            recovery_window: Duration::from_std(config.recovery_window)
                .unwrap_or_else(|_| Duration::hours(6)),
            offline_retention: Duration::from_std(config.offline_retention)
                .unwrap_or_else(|_| Duration::days(7)),
            queue_lock: Mutex::new(()),
        }
    }

    // ─── Active Snapshot ─────────────────────────────────────────

    /// Overwrite the single active snapshot.
    ///
    /// Stamps `saved_at`, clamped so it never regresses past the previous
    /// last-save record even across a wall-clock jump. Also writes the
    /// separate last-save timestamp key so recovery-eligibility checks do
    /// not pay full snapshot deserialization.
    pub fn save_snapshot(&self, mut snapshot: ActiveSessionSnapshot) {
        let now = Utc::now();
        let previous = self.last_save_at();
        snapshot.saved_at = match previous {
            Some(prev) if prev > now => prev,
            _ => now,
        };

        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(
                    session_id = %snapshot.session_id,
                    error = %e,
                    "Failed to serialize snapshot; session loop continues"
                );
                return;
            }
        };

        if let Err(e) = self.kv.set_string(keys::ACTIVE_SNAPSHOT, &json) {
            tracing::error!(
                session_id = %snapshot.session_id,
                error = %e,
                "Failed to persist snapshot; session loop continues"
            );
            return;
        }

        if let Err(e) = self
            .kv
            .set_i64(keys::LAST_SAVE_MILLIS, time_utils::to_epoch_millis(snapshot.saved_at))
        {
            tracing::error!(error = %e, "Failed to persist last-save timestamp");
        }

        tracing::info!(
            session_id = %snapshot.session_id,
            fixes = snapshot.route.len(),
            distance_km = snapshot.distance_km,
            saved_at = %time_utils::format_utc_rfc3339(snapshot.saved_at),
            "Saved active session snapshot"
        );
    }

    /// Load the stored snapshot, or `None` if absent or corrupt.
    ///
    /// Corruption is logged and treated as "nothing to recover".
    pub fn load_snapshot(&self) -> Option<ActiveSessionSnapshot> {
        let json = match self.kv.get_string(keys::ACTIVE_SNAPSHOT) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read snapshot; treating as absent");
                return None;
            }
        };

        let mut snapshot: ActiveSessionSnapshot = match serde_json::from_str(&json) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt snapshot; treating as nothing to recover");
                return None;
            }
        };

        if !snapshot.has_session() {
            return None;
        }

        if snapshot.normalize() {
            tracing::warn!(
                session_id = %snapshot.session_id,
                fixes = snapshot.route.len(),
                "Snapshot route was out of order; re-sorted on load"
            );
        }

        Some(snapshot)
    }

    /// True iff a snapshot with a non-empty session identifier exists.
    pub fn has_active_snapshot(&self) -> bool {
        self.load_snapshot().is_some()
    }

    /// When the snapshot was last saved, if ever.
    pub fn last_save_at(&self) -> Option<DateTime<Utc>> {
        match self.kv.get_i64(keys::LAST_SAVE_MILLIS) {
            Ok(Some(millis)) => time_utils::from_epoch_millis(millis),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read last-save timestamp");
                None
            }
        }
    }

    /// True iff the last save is recent enough to offer recovery.
    ///
    /// Bounds how long an abandoned session can resurrect itself; a
    /// week-old orphaned snapshot must not come back as a live session.
    pub fn is_recovery_eligible(&self) -> bool {
        self.recovery_eligible_at(Utc::now())
    }

    /// Recovery-eligibility check against an explicit `now`.
    ///
    /// Eligible strictly below the recovery window: false at exactly the
    /// boundary and beyond.
    pub fn recovery_eligible_at(&self, now: DateTime<Utc>) -> bool {
        let Some(saved_at) = self.last_save_at() else {
            tracing::debug!("Recovery check: no last-save timestamp");
            return false;
        };
        let age = now.signed_duration_since(saved_at);
        let eligible = age < self.recovery_window;
        tracing::info!(
            age_secs = age.num_seconds(),
            window_secs = self.recovery_window.num_seconds(),
            eligible,
            "Recovery eligibility check"
        );
        eligible
    }

    /// Remove the snapshot and its last-save timestamp.
    pub fn clear_snapshot(&self) {
        if let Err(e) = self.kv.remove(keys::ACTIVE_SNAPSHOT) {
            tracing::error!(error = %e, "Failed to remove snapshot");
        }
        if let Err(e) = self.kv.remove(keys::LAST_SAVE_MILLIS) {
            tracing::error!(error = %e, "Failed to remove last-save timestamp");
        }
        tracing::info!("Cleared active session snapshot");
    }

    // ─── Offline Completion Queue ────────────────────────────────

    /// Append a completed-but-unsynced session to the offline queue.
    pub fn enqueue_offline_completion(&self, record: OfflineCompletedSession) {
        let _guard = self.queue_lock.lock().expect("queue lock poisoned");
        let mut queue = self.read_queue();
        let offline_id = record.offline_id.clone();
        queue.push(record);
        self.write_queue(&queue);
        tracing::info!(
            offline_id = %offline_id,
            queue_len = queue.len(),
            "Enqueued offline completion"
        );
    }

    /// All records still waiting for backend confirmation.
    pub fn list_pending_offline_completions(&self) -> Vec<OfflineCompletedSession> {
        self.read_queue()
            .into_iter()
            .filter(|record| !record.synced)
            .collect()
    }

    /// Flip `synced` and stamp `synced_at` on the record with `id`.
    ///
    /// No-op if the id is not queued. The flip rewrites the whole queue
    /// rather than the one record; callers must not race this with
    /// `enqueue`/`prune` outside this store (the internal lock covers
    /// in-process callers).
    pub fn mark_offline_completion_synced(&self, id: &str) {
        let _guard = self.queue_lock.lock().expect("queue lock poisoned");
        let mut queue = self.read_queue();
        let Some(record) = queue
            .iter_mut()
            .find(|record| record.offline_id == id && !record.synced)
        else {
            tracing::debug!(offline_id = %id, "Mark-synced: id not pending; no-op");
            return;
        };
        record.synced = true;
        record.synced_at = Some(Utc::now());
        self.write_queue(&queue);
        tracing::info!(offline_id = %id, "Marked offline completion synced");
    }

    /// Drop synced records older than the retention window.
    ///
    /// Retains every unsynced record regardless of age, plus synced records
    /// whose `synced_at` is within retention.
    pub fn prune_synced_offline_completions(&self) {
        let _guard = self.queue_lock.lock().expect("queue lock poisoned");
        let queue = self.read_queue();
        let before = queue.len();
        let cutoff = Utc::now() - self.offline_retention;
        let retained: Vec<OfflineCompletedSession> = queue
            .into_iter()
            .filter(|record| {
                !record.synced || record.synced_at.map(|at| at > cutoff).unwrap_or(true)
            })
            .collect();
        let dropped = before - retained.len();
        if dropped > 0 {
            self.write_queue(&retained);
        }
        tracing::info!(dropped, retained = retained.len(), "Pruned offline queue");
    }

    /// Read the whole queue; malformed persisted JSON reads as empty.
    fn read_queue(&self) -> Vec<OfflineCompletedSession> {
        let json = match self.kv.get_string(keys::OFFLINE_QUEUE) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read offline queue; treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&json) {
            Ok(queue) => queue,
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt offline queue; treating as empty");
                Vec::new()
            }
        }
    }

    fn write_queue(&self, queue: &[OfflineCompletedSession]) {
        let json = match serde_json::to_string(queue) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize offline queue");
                return;
            }
        };
        if let Err(e) = self.kv.set_string(keys::OFFLINE_QUEUE, &json) {
            tracing::error!(error = %e, "Failed to persist offline queue");
        }
    }
}
