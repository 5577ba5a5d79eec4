// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable snapshot of one in-progress ruck session.
//!
//! The snapshot is what survives process death: the session controller
//! rebuilds its in-memory state from this record on recovery. Reads are
//! deliberately tolerant: missing fields fall back to documented defaults
//! (0, empty sequence, "now") rather than failing deserialization, so a
//! snapshot written by an older build still recovers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single GPS fix on the session's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Elevation above sea level (meters)
    #[serde(default)]
    pub elevation_m: f64,
    /// When the fix was recorded
    #[serde(default = "now_utc")]
    pub timestamp: DateTime<Utc>,
    /// Reported horizontal accuracy (meters)
    #[serde(default)]
    pub accuracy_m: f64,
}

/// One heart-rate reading attached to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Beats per minute
    pub bpm: u32,
    /// When the sample was taken
    #[serde(default = "now_utc")]
    pub timestamp: DateTime<Utc>,
}

/// The durable record of one in-progress session.
///
/// At most one snapshot exists in the store at any time (single-active-session
/// model). `session_id` is immutable for the lifetime of one snapshot and an
/// empty id means "nothing stored".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSessionSnapshot {
    /// Opaque session identifier
    #[serde(default)]
    pub session_id: String,

    // ─── Route ───────────────────────────────────────────────────
    /// Ordered GPS fixes, non-decreasing by timestamp
    #[serde(default)]
    pub route: Vec<LocationFix>,

    // ─── Elapsed Metrics ─────────────────────────────────────────
    /// Wall-clock seconds of activity
    #[serde(default)]
    pub elapsed_seconds: u64,
    /// Distance covered (kilometers)
    #[serde(default)]
    pub distance_km: f64,
    /// Calories burned so far
    #[serde(default)]
    pub calories: f64,
    /// Cumulative elevation gain (meters)
    #[serde(default)]
    pub elevation_gain_m: f64,
    /// Cumulative elevation loss (meters)
    #[serde(default)]
    pub elevation_loss_m: f64,
    /// Carried load weight (kilograms)
    #[serde(default)]
    pub ruck_weight_kg: f64,

    // ─── Session Timing ──────────────────────────────────────────
    /// Session start time (UTC)
    #[serde(default = "now_utc")]
    pub started_at: DateTime<Utc>,

    // ─── Heart Rate ──────────────────────────────────────────────
    /// Ordered heart-rate samples, if a monitor is paired
    #[serde(default)]
    pub heart_rate_samples: Vec<HeartRateSample>,
    /// Most recent heart rate (bpm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_heart_rate: Option<u32>,
    /// Minimum heart rate seen this session (bpm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_heart_rate: Option<u32>,
    /// Maximum heart rate seen this session (bpm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<u32>,

    // ─── Metadata ────────────────────────────────────────────────
    /// When this snapshot was written; monotonically non-decreasing
    /// across successive writes for the same session
    #[serde(default = "now_utc")]
    pub saved_at: DateTime<Utc>,
}

fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

impl ActiveSessionSnapshot {
    /// New empty snapshot for a freshly started session.
    pub fn new(session_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            route: Vec::new(),
            elapsed_seconds: 0,
            distance_km: 0.0,
            calories: 0.0,
            elevation_gain_m: 0.0,
            elevation_loss_m: 0.0,
            ruck_weight_kg: 0.0,
            started_at,
            heart_rate_samples: Vec::new(),
            latest_heart_rate: None,
            min_heart_rate: None,
            max_heart_rate: None,
            saved_at: started_at,
        }
    }

    /// True if this snapshot carries a usable session identifier.
    pub fn has_session(&self) -> bool {
        !self.session_id.is_empty()
    }

    /// Restore the route-ordering invariant after a tolerant read.
    ///
    /// Fixes must be non-decreasing by timestamp. A snapshot persisted
    /// mid-write or by a buggy older build may violate that; we sort rather
    /// than reject, matching the tolerant-read contract.
    pub fn normalize(&mut self) -> bool {
        let ordered = self
            .route
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp);
        if !ordered {
            self.route.sort_by_key(|fix| fix.timestamp);
        }
        !ordered
    }
}
