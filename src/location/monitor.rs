// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Positioning monitor: location stream ownership plus GPS-health watchdogs.
//!
//! Background location delivery is throttled unpredictably by mobile power
//! management, and a monitor that passively trusts the stream will silently
//! under-report distance for many minutes. Two independent watchdogs catch
//! the two failure modes seen in the field:
//!
//! - **timeout**: complete silence past the expected cadence; recovered by
//!   cancelling and resubscribing the stream with identical parameters.
//! - **staleness**: fixes arriving on schedule but stuck on the same
//!   coordinates; recovered by injecting a one-shot high-accuracy fix, then
//!   restarting if the stream stays stuck for a second window.
//!
//! Both deadlines live inside a single supervisor task's `select!` loop, so
//! a restart atomically retires the old subscription and both watchdogs; no
//! timer can fire against a dead stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::location::geo;
use crate::location::provider::{
    FixAccuracy, FixRequest, FixStream, LocationError, LocationProvider,
};
use crate::models::LocationFix;

/// Tracking state machine: `Idle -> Tracking -> Restarting -> Tracking`,
/// back to `Idle` on explicit stop or a provider-level fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Tracking,
    Restarting,
}

/// Owns the platform fix stream and its health heuristics.
pub struct PositionMonitor {
    provider: Arc<dyn LocationProvider>,
    fix_timeout: Duration,
    staleness_window: Duration,
    stale_epsilon_m: f64,
    state: Arc<Mutex<TrackingState>>,
    restarts: Arc<AtomicU64>,
    active: Mutex<Option<CancellationToken>>,
}

impl PositionMonitor {
    pub fn new(provider: Arc<dyn LocationProvider>, config: &EngineConfig) -> Self {
        Self {
            provider,
            fix_timeout: config.fix_timeout,
            staleness_window: config.staleness_window,
            stale_epsilon_m: config.stale_epsilon_m,
            state: Arc::new(Mutex::new(TrackingState::Idle)),
            restarts: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
        }
    }

    /// Current state of the tracking state machine.
    pub fn state(&self) -> TrackingState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// Number of watchdog-triggered stream restarts since construction.
    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }

    /// Begin tracking at the given minimum sampling interval.
    ///
    /// Single-subscriber semantics: any previous stream is stopped first.
    /// The returned receiver yields every fix the stream delivers, stale
    /// ones included; staleness is a health signal, not a filter.
    pub async fn start_tracking(
        &self,
        min_interval: Duration,
    ) -> Result<mpsc::Receiver<LocationFix>, LocationError> {
        self.stop_tracking();

        let request = FixRequest {
            min_interval,
            accuracy: FixAccuracy::High,
        };
        let stream = self.provider.subscribe(request).await?;

        let (tx, rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        *self.active.lock().expect("active lock poisoned") = Some(cancel.clone());
        set_state(&self.state, TrackingState::Tracking);
        tracing::info!(
            min_interval_ms = min_interval.as_millis() as u64,
            "Location tracking started"
        );

        tokio::spawn(supervise(Supervisor {
            provider: self.provider.clone(),
            request,
            stream,
            tx,
            cancel,
            fix_timeout: self.fix_timeout,
            staleness_window: self.staleness_window,
            stale_epsilon_m: self.stale_epsilon_m,
            state: self.state.clone(),
            restarts: self.restarts.clone(),
        }));

        Ok(rx)
    }

    /// Cancel the stream subscription and both watchdogs. Idempotent.
    pub fn stop_tracking(&self) {
        let previous = self.active.lock().expect("active lock poisoned").take();
        if let Some(cancel) = previous {
            cancel.cancel();
            tracing::info!("Location tracking stopped");
        }
        set_state(&self.state, TrackingState::Idle);
    }

    /// One-shot high-accuracy fix, independent of the stream.
    pub async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        self.provider.current_fix(FixAccuracy::High).await
    }
}

fn set_state(state: &Arc<Mutex<TrackingState>>, next: TrackingState) {
    let mut guard = state.lock().expect("state lock poisoned");
    if *guard != next {
        tracing::debug!(from = ?*guard, to = ?next, "Tracking state transition");
        *guard = next;
    }
}

/// Everything the supervisor task owns.
struct Supervisor {
    provider: Arc<dyn LocationProvider>,
    request: FixRequest,
    stream: FixStream,
    tx: mpsc::Sender<LocationFix>,
    cancel: CancellationToken,
    fix_timeout: Duration,
    staleness_window: Duration,
    stale_epsilon_m: f64,
    state: Arc<Mutex<TrackingState>>,
    restarts: Arc<AtomicU64>,
}

/// Transient GPS health state; reset on start/stop/restart.
struct GpsHealth {
    last_fix_at: Instant,
    last_coords: Option<(f64, f64)>,
    /// When the current run of negligible-movement fixes began.
    stall_since: Option<Instant>,
    /// Whether the fresh-fix nudge was already issued for this stall.
    nudged: bool,
}

impl GpsHealth {
    fn reset() -> Self {
        Self {
            last_fix_at: Instant::now(),
            last_coords: None,
            stall_since: None,
            nudged: false,
        }
    }

    /// Record an arriving fix. Returns true if it was stale (within epsilon
    /// of the previous fix). A moving fix resets both watchdog conditions.
    ///
    /// A stall is anchored at the arrival of the first fix of the identical
    /// run, i.e. the previous fix, since that is when real movement last
    /// reached us.
    fn observe(&mut self, fix: &LocationFix, epsilon_m: f64) -> bool {
        let coords = (fix.latitude, fix.longitude);
        let stale = match self.last_coords {
            Some(prev) => geo::distance_between_km(prev, coords) * 1000.0 < epsilon_m,
            None => false,
        };
        if stale {
            if self.stall_since.is_none() {
                self.stall_since = Some(self.last_fix_at);
            }
        } else {
            self.stall_since = None;
            self.nudged = false;
        }
        self.last_coords = Some(coords);
        self.last_fix_at = Instant::now();
        stale
    }
}

enum Step {
    Continue,
    Nudge,
    Restart(&'static str),
    Stop,
}

async fn supervise(mut sup: Supervisor) {
    let mut health = GpsHealth::reset();

    loop {
        let timeout_deadline = health.last_fix_at + sup.fix_timeout;
        // Disarmed staleness watchdog sleeps effectively forever.
        let stale_deadline = health
            .stall_since
            .map(|since| since + sup.staleness_window)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400 * 365));

        let step = tokio::select! {
            _ = sup.cancel.cancelled() => Step::Stop,

            next = sup.stream.next() => match next {
                Some(Ok(fix)) => {
                    let stale = health.observe(&fix, sup.stale_epsilon_m);
                    if stale {
                        tracing::debug!(
                            latitude = fix.latitude,
                            longitude = fix.longitude,
                            "Stale fix: no meaningful movement"
                        );
                    }
                    if sup.tx.send(fix).await.is_err() {
                        // Subscriber dropped the receiver; nothing left to feed.
                        set_state(&sup.state, TrackingState::Idle);
                        Step::Stop
                    } else {
                        Step::Continue
                    }
                }
                Some(Err(e)) => {
                    // Provider-level fault: no auto-retry, caller decides.
                    tracing::warn!(error = %e, "Location provider fault; tracking stopped");
                    set_state(&sup.state, TrackingState::Idle);
                    Step::Stop
                }
                None => {
                    tracing::warn!("Location stream ended; tracking stopped");
                    set_state(&sup.state, TrackingState::Idle);
                    Step::Stop
                }
            },

            _ = tokio::time::sleep_until(timeout_deadline) => {
                tracing::warn!(
                    timeout_secs = sup.fix_timeout.as_secs(),
                    "No fix within timeout window"
                );
                Step::Restart("gps_timeout")
            }

            _ = tokio::time::sleep_until(stale_deadline) => {
                if health.nudged {
                    tracing::warn!("Staleness persisted past second window");
                    Step::Restart("gps_stale")
                } else {
                    Step::Nudge
                }
            }
        };

        match step {
            Step::Continue => {}
            Step::Stop => break,
            Step::Nudge => {
                if let Step::Stop = nudge_fresh_fix(&mut sup, &mut health).await {
                    break;
                }
            }
            Step::Restart(reason) => {
                if !restart(&mut sup, &mut health, reason).await {
                    break;
                }
            }
        }
    }
}

/// Staleness first fired: inject a one-shot high-accuracy fix into the
/// stream as a synthetic fix, then give the stream one more window.
async fn nudge_fresh_fix(sup: &mut Supervisor, health: &mut GpsHealth) -> Step {
    tracing::warn!("Stale coordinates; requesting fresh fix");
    // Arm the second window before observing: a moving fresh fix clears it.
    health.nudged = true;
    health.stall_since = Some(Instant::now());

    match sup.provider.current_fix(FixAccuracy::High).await {
        Ok(fix) => {
            health.observe(&fix, sup.stale_epsilon_m);
            if sup.tx.send(fix).await.is_err() {
                set_state(&sup.state, TrackingState::Idle);
                return Step::Stop;
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Fresh-fix request failed");
        }
    }
    Step::Continue
}

/// Cancel the current subscription and start a new stream with identical
/// parameters. Returns false if resubscription failed and tracking stopped.
async fn restart(sup: &mut Supervisor, health: &mut GpsHealth, reason: &'static str) -> bool {
    set_state(&sup.state, TrackingState::Restarting);
    let attempt = sup.restarts.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::warn!(reason, attempt, "Restarting location stream");

    // Drop the old stream first: the platform subscription must be dead
    // before the replacement exists. Both watchdog deadlines are recomputed
    // from the reset health state, so nothing can fire against it either.
    sup.stream = futures_util::stream::pending().boxed();

    match sup.provider.subscribe(sup.request).await {
        Ok(stream) => {
            sup.stream = stream;
            *health = GpsHealth::reset();
            set_state(&sup.state, TrackingState::Tracking);
            tracing::info!(reason, attempt, "Location stream restarted");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "Resubscription failed; tracking stopped");
            set_state(&sup.state, TrackingState::Idle);
            false
        }
    }
}
