// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Positioning: provider seam, GPS-health monitor, great-circle distance.

pub mod geo;
pub mod monitor;
pub mod provider;

pub use monitor::{PositionMonitor, TrackingState};
pub use provider::{FixAccuracy, FixRequest, FixStream, LocationError, LocationProvider};
