// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared fixtures for the integration suites.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures_util::stream::{self, StreamExt};

use ruck_session_engine::config::EngineConfig;
use ruck_session_engine::lifecycle::{PausableWork, SessionController};
use ruck_session_engine::location::{
    FixAccuracy, FixRequest, FixStream, LocationError, LocationProvider,
};
use ruck_session_engine::models::{
    ActiveSessionSnapshot, CompletionPayload, HeartRateSample, LocationFix,
    OfflineCompletedSession,
};
use ruck_session_engine::store::{MemoryKeyValueStore, SessionStore};
use ruck_session_engine::sync::{CompletionUploader, UploadError};

/// Opt-in log output for debugging test failures (RUST_LOG=debug).
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[allow(dead_code)]
pub fn test_store() -> (Arc<MemoryKeyValueStore>, Arc<SessionStore>) {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let store = Arc::new(SessionStore::new(kv.clone(), &EngineConfig::test_default()));
    (kv, store)
}

/// A realistic mid-session snapshot with route and heart-rate data.
#[allow(dead_code)]
pub fn sample_snapshot(session_id: &str) -> ActiveSessionSnapshot {
    let started_at = Utc.with_ymd_and_hms(2025, 11, 2, 7, 30, 0).unwrap();
    let mut snapshot = ActiveSessionSnapshot::new(session_id, started_at);
    snapshot.route = (0..3)
        .map(|i| LocationFix {
            latitude: 37.4419 + i as f64 * 0.001,
            longitude: -122.1430,
            elevation_m: 30.0 + i as f64,
            timestamp: started_at + chrono::Duration::seconds(i * 60),
            accuracy_m: 5.0,
        })
        .collect();
    snapshot.elapsed_seconds = 180;
    snapshot.distance_km = 0.22;
    snapshot.calories = 31.0;
    snapshot.elevation_gain_m = 3.0;
    snapshot.elevation_loss_m = 1.0;
    snapshot.ruck_weight_kg = 13.6;
    snapshot.heart_rate_samples = vec![
        HeartRateSample {
            bpm: 112,
            timestamp: started_at + chrono::Duration::seconds(60),
        },
        HeartRateSample {
            bpm: 127,
            timestamp: started_at + chrono::Duration::seconds(120),
        },
    ];
    snapshot.latest_heart_rate = Some(127);
    snapshot.min_heart_rate = Some(112);
    snapshot.max_heart_rate = Some(127);
    snapshot
}

/// Offline record completed `completed_days_ago` days in the past; if
/// `synced_days_ago` is set the record is synced with that `synced_at` age.
#[allow(dead_code)]
pub fn offline_record(
    offline_id: &str,
    completed_days_ago: i64,
    synced_days_ago: Option<i64>,
) -> OfflineCompletedSession {
    let completed_at = Utc::now() - chrono::Duration::days(completed_days_ago);
    OfflineCompletedSession {
        offline_id: offline_id.to_string(),
        completed_at,
        ruck_weight_kg: 9.0,
        notes: String::new(),
        started_at: completed_at - chrono::Duration::hours(1),
        payload: serde_json::json!({ "id": offline_id, "distance_km": 4.8 }),
        synced: synced_days_ago.is_some(),
        synced_at: synced_days_ago.map(|days| Utc::now() - chrono::Duration::days(days)),
    }
}

// ─── Session Controller ──────────────────────────────────────────

/// Records every engine-to-controller interaction.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingController {
    active: AtomicBool,
    snapshot: Mutex<Option<ActiveSessionSnapshot>>,
    pub seeded: Mutex<Vec<ActiveSessionSnapshot>>,
    pub cleanups: AtomicUsize,
    fail_cleanup: AtomicBool,
}

#[allow(dead_code)]
impl RecordingController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_session(snapshot: ActiveSessionSnapshot) -> Arc<Self> {
        let controller = Self::default();
        controller.active.store(true, Ordering::SeqCst);
        *controller.snapshot.lock().unwrap() = Some(snapshot);
        Arc::new(controller)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn set_snapshot(&self, snapshot: ActiveSessionSnapshot) {
        *self.snapshot.lock().unwrap() = Some(snapshot);
    }

    pub fn fail_emergency_cleanup(&self) {
        self.fail_cleanup.store(true, Ordering::SeqCst);
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

impl SessionController for RecordingController {
    fn is_session_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn current_snapshot(&self) -> Option<ActiveSessionSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    fn seed_from_snapshot(&self, snapshot: ActiveSessionSnapshot) {
        self.seeded.lock().unwrap().push(snapshot);
    }

    fn emergency_cleanup(&self) -> anyhow::Result<()> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        if self.fail_cleanup.load(Ordering::SeqCst) {
            anyhow::bail!("teardown raced the cleanup write");
        }
        Ok(())
    }
}

// ─── Background Work ─────────────────────────────────────────────

/// Counts pause/resume calls, standing in for a notification poller.
#[derive(Default)]
#[allow(dead_code)]
pub struct CountingWork {
    pub paused: AtomicUsize,
    pub resumed: AtomicUsize,
}

impl PausableWork for CountingWork {
    fn pause(&self) {
        self.paused.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.resumed.fetch_add(1, Ordering::SeqCst);
    }
}

// ─── Location Provider ───────────────────────────────────────────

/// What the fake platform stream does after subscription.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum ProviderScript {
    /// Fixes that move ~111 m per tick.
    Moving { period: Duration },
    /// `count` moving fixes, then silence forever.
    MovingThenSilent { period: Duration, count: usize },
    /// The same coordinates every tick, forever.
    Stuck { period: Duration },
    /// One moving fix, then a provider-level error.
    Failing { period: Duration },
    /// Never emits.
    Silent,
}

/// Scripted platform location provider.
#[allow(dead_code)]
pub struct FakeLocationProvider {
    script: ProviderScript,
    base: (f64, f64),
    /// One-shot fixes report movement (true) or the stuck coordinates.
    one_shot_moves: bool,
    pub subscribes: AtomicUsize,
    pub one_shots: AtomicUsize,
}

#[allow(dead_code)]
impl FakeLocationProvider {
    pub fn new(script: ProviderScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            base: (37.4419, -122.1430),
            one_shot_moves: false,
            subscribes: AtomicUsize::new(0),
            one_shots: AtomicUsize::new(0),
        })
    }

    /// One-shot fixes break the stall instead of confirming it.
    pub fn with_moving_one_shots(script: ProviderScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            base: (37.4419, -122.1430),
            one_shot_moves: true,
            subscribes: AtomicUsize::new(0),
            one_shots: AtomicUsize::new(0),
        })
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn one_shot_count(&self) -> usize {
        self.one_shots.load(Ordering::SeqCst)
    }
}

fn fix_at(lat: f64, lon: f64) -> LocationFix {
    LocationFix {
        latitude: lat,
        longitude: lon,
        elevation_m: 30.0,
        timestamp: Utc::now(),
        accuracy_m: 5.0,
    }
}

#[async_trait]
impl LocationProvider for FakeLocationProvider {
    async fn subscribe(&self, _request: FixRequest) -> Result<FixStream, LocationError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let base = self.base;

        let stream = match self.script {
            ProviderScript::Silent => stream::pending().boxed(),

            ProviderScript::Moving { period } => stream::unfold(0u64, move |i| async move {
                tokio::time::sleep(period).await;
                Some((Ok(fix_at(base.0 + i as f64 * 0.001, base.1)), i + 1))
            })
            .boxed(),

            ProviderScript::MovingThenSilent { period, count } => {
                stream::unfold(0usize, move |i| async move {
                    if i >= count {
                        futures_util::future::pending::<()>().await;
                    }
                    tokio::time::sleep(period).await;
                    Some((Ok(fix_at(base.0 + i as f64 * 0.001, base.1)), i + 1))
                })
                .boxed()
            }

            ProviderScript::Stuck { period } => stream::unfold((), move |()| async move {
                tokio::time::sleep(period).await;
                Some((Ok(fix_at(base.0, base.1)), ()))
            })
            .boxed(),

            ProviderScript::Failing { period } => stream::unfold(0u32, move |i| async move {
                tokio::time::sleep(period).await;
                if i == 0 {
                    Some((Ok(fix_at(base.0, base.1)), 1))
                } else {
                    Some((
                        Err(LocationError::Provider("position update failed".into())),
                        i + 1,
                    ))
                }
            })
            .boxed(),
        };

        Ok(stream)
    }

    async fn current_fix(&self, _accuracy: FixAccuracy) -> Result<LocationFix, LocationError> {
        let n = self.one_shots.fetch_add(1, Ordering::SeqCst);
        if self.one_shot_moves {
            // Far from the base coordinates and from prior one-shots.
            Ok(fix_at(self.base.0 + 1.0 + n as f64 * 0.01, self.base.1))
        } else {
            Ok(fix_at(self.base.0, self.base.1))
        }
    }
}

// ─── Uploader ────────────────────────────────────────────────────

/// Uploader that fails for payloads whose `"id"` is in the fail set.
#[derive(Default)]
#[allow(dead_code)]
pub struct ScriptedUploader {
    fail_ids: Mutex<HashSet<String>>,
    pub uploads: Mutex<Vec<CompletionPayload>>,
}

#[allow(dead_code)]
impl ScriptedUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, id: &str) {
        self.fail_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionUploader for ScriptedUploader {
    async fn upload(&self, payload: &CompletionPayload) -> Result<(), UploadError> {
        let id = payload["id"].as_str().unwrap_or_default().to_string();
        if self.fail_ids.lock().unwrap().contains(&id) {
            return Err(UploadError::Unreachable("no route to host".into()));
        }
        self.uploads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}
