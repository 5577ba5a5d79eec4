// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the engine.

pub mod offline;
pub mod snapshot;

pub use offline::{CompletionPayload, OfflineCompletedSession};
pub use snapshot::{ActiveSessionSnapshot, HeartRateSample, LocationFix};
