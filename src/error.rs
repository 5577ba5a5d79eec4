// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Engine error types.
//!
//! Storage faults never surface through these types: the session store
//! catches and logs them internally (see `store::session_store`). What is
//! left here are the failures a caller can actually act on: provider
//! subscription errors, upload failures, and opaque host-callback errors.

use crate::location::LocationError;
use crate::store::StoreError;

/// Top-level error type for the few engine APIs that do propagate failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Location provider error: {0}")]
    Location(#[from] LocationError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
