//! Engine configuration.
//!
//! Every threshold the continuity engine depends on lives here, loaded once
//! at startup. Implementation selection is always an explicit config input,
//! never a build-mode side effect.

use std::env;
use std::time::Duration;

/// Tunables for the continuity engine, loaded once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // --- Persistence ---
    /// Cadence of periodic snapshot autosaves
    pub autosave_interval: Duration,
    /// Age past which a snapshot is no longer offered for resumption
    pub recovery_window: Duration,
    /// Age past which a snapshot is purged outright; larger than the
    /// recovery window so an expired snapshot stays inspectable for a while
    pub snapshot_retention: Duration,
    /// Cadence of the cleanup sweep
    pub sweep_interval: Duration,
    /// How long synced offline completions are retained before pruning
    pub offline_retention: Duration,

    // --- GPS Health ---
    /// Silence past this duration triggers a stream restart
    pub fix_timeout: Duration,
    /// Negligible-movement run past this duration triggers the fresh-fix
    /// nudge, and a second window of it triggers a restart
    pub staleness_window: Duration,
    /// Movement below this many meters between fixes counts as no movement
    pub stale_epsilon_m: f64,
    /// Minimum sampling interval requested from the platform stream
    pub min_fix_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(150),
            recovery_window: Duration::from_secs(6 * 3600),
            snapshot_retention: Duration::from_secs(12 * 3600),
            sweep_interval: Duration::from_secs(3600),
            offline_retention: Duration::from_secs(7 * 24 * 3600),
            fix_timeout: Duration::from_secs(30),
            staleness_window: Duration::from_secs(45),
            stale_epsilon_m: 2.0,
            min_fix_interval: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Every knob has a production default; variables only override.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();
        Self {
            autosave_interval: env_secs("RUCK_AUTOSAVE_SECS", defaults.autosave_interval),
            recovery_window: env_secs("RUCK_RECOVERY_WINDOW_SECS", defaults.recovery_window),
            snapshot_retention: env_secs(
                "RUCK_SNAPSHOT_RETENTION_SECS",
                defaults.snapshot_retention,
            ),
            sweep_interval: env_secs("RUCK_SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            offline_retention: env_secs("RUCK_OFFLINE_RETENTION_SECS", defaults.offline_retention),
            fix_timeout: env_secs("RUCK_FIX_TIMEOUT_SECS", defaults.fix_timeout),
            staleness_window: env_secs("RUCK_STALENESS_WINDOW_SECS", defaults.staleness_window),
            stale_epsilon_m: env::var("RUCK_STALE_EPSILON_M")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.stale_epsilon_m),
            min_fix_interval: env::var("RUCK_MIN_FIX_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.min_fix_interval),
        }
    }

    /// Config for tests: production thresholds, deterministic source.
    pub fn test_default() -> Self {
        Self::default()
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
