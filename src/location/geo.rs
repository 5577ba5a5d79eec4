// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Great-circle distance.
//!
//! Haversine with a fixed mean earth radius. Live metrics, staleness
//! detection and terrain-segment lengths all go through this one function so
//! historical data stays comparable across platforms.

use crate::models::LocationFix;

/// Mean earth radius (kilometers).
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two `(latitude, longitude)` pairs, in
/// kilometers. Coordinates are decimal degrees.
pub fn distance_between_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Distance between two fixes, in kilometers.
pub fn distance_between_fixes_km(a: &LocationFix, b: &LocationFix) -> f64 {
    distance_between_km((a.latitude, a.longitude), (b.latitude, b.longitude))
}
