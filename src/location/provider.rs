// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform location provider seam.
//!
//! The host implements [`LocationProvider`] over the platform's location
//! services. The provider is assumed to honor the requested interval and
//! accuracy tier but may silently stop delivering fixes under OS power
//! management; the monitor's watchdogs defend against exactly that.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::models::LocationFix;

/// Location-layer errors, caught at the stream-subscription boundary.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location services unavailable")]
    ServiceUnavailable,

    #[error("Provider error: {0}")]
    Provider(String),
}

/// Accuracy tier requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixAccuracy {
    /// Power-friendly accuracy for continuous streaming
    Balanced,
    /// Best available accuracy, used for one-shot fixes
    High,
}

/// Parameters for a fix-stream subscription.
#[derive(Debug, Clone, Copy)]
pub struct FixRequest {
    /// Minimum sampling interval between fixes
    pub min_interval: Duration,
    /// Requested accuracy tier
    pub accuracy: FixAccuracy,
}

/// Stream of fixes from the platform.
pub type FixStream = BoxStream<'static, Result<LocationFix, LocationError>>;

/// Platform location services.
#[async_trait]
pub trait LocationProvider: Send + Sync + 'static {
    /// Begin a fix stream with the given parameters.
    async fn subscribe(&self, request: FixRequest) -> Result<FixStream, LocationError>;

    /// One-shot fix at the requested accuracy, independent of any stream.
    async fn current_fix(&self, accuracy: FixAccuracy) -> Result<LocationFix, LocationError>;
}
