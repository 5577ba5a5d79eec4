// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offline-completed session records.
//!
//! A session that finishes while the backend is unreachable is queued here
//! and drained later by the sync worker (see `crate::sync`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque payload the backend needs to finalize a completed session.
///
/// The engine never inspects it; it is produced by the session controller at
/// completion time and handed verbatim to the uploader.
pub type CompletionPayload = serde_json::Value;

/// A session completed without backend confirmation, queued for later sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineCompletedSession {
    /// Queue-unique identifier for this offline record
    pub offline_id: String,
    /// When the session completed (normally or via emergency cleanup)
    pub completed_at: DateTime<Utc>,
    /// Carried load weight (kilograms)
    #[serde(default)]
    pub ruck_weight_kg: f64,
    /// Free-text notes attached at completion
    #[serde(default)]
    pub notes: String,
    /// Original session start time
    #[serde(default = "now_utc")]
    pub started_at: DateTime<Utc>,
    /// Opaque completion payload for the backend
    #[serde(default = "empty_payload")]
    pub payload: CompletionPayload,
    /// Whether the backend has confirmed this record
    #[serde(default)]
    pub synced: bool,
    /// When the backend confirmed it; set exactly once when `synced` flips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

fn empty_payload() -> CompletionPayload {
    serde_json::Value::Null
}
