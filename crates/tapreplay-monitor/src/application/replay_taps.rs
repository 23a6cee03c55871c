//! ReplayDriver: turns gesture effects into tap injections.
//!
//! The gesture tracker decides *whether* and *where* to replay; this use case
//! decides *how*.  Bursts run as background tasks so the read loop never
//! blocks on `adb`.  The hold policy is delegated to a [`HoldTicker`].
//!
//! # Architecture
//!
//! The driver depends only on the [`TapSink`] trait.  The adb-backed sink,
//! the dry-run sink, and the recording test sink are all injected at
//! construction time, so the driver is unit-testable without a device.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tapreplay_core::{GestureEffect, ReplayPolicy, ScaledPoint};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::application::hold_ticker::HoldTicker;

/// Upper bound on bursts running at the same time, unless configured.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Error type for tap injection.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tap command exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("injection failed: {0}")]
    Platform(String),
}

/// Trait for injecting taps at display coordinates.
///
/// `repeat` taps are issued at `point` as one injection; the call returns once
/// they have all been delivered (or failed).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TapSink: Send + Sync {
    async fn tap(&self, point: ScaledPoint, repeat: u32) -> Result<(), InjectionError>;
}

/// Counters kept by the driver, logged when the monitor stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub bursts_started: u64,
    pub bursts_skipped: u64,
    pub bursts_aborted: u64,
    pub debounced: u64,
    pub discarded: u64,
    pub holds_started: u64,
}

/// Executes [`GestureEffect`]s according to the active [`ReplayPolicy`].
pub struct ReplayDriver {
    sink: Arc<dyn TapSink>,
    policy: ReplayPolicy,
    max_in_flight: usize,
    in_flight: JoinSet<()>,
    hold: Option<HoldTicker>,
    stats: ReplayStats,
}

impl ReplayDriver {
    pub fn new(sink: Arc<dyn TapSink>, policy: ReplayPolicy) -> Self {
        Self {
            sink,
            policy,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            in_flight: JoinSet::new(),
            hold: None,
            stats: ReplayStats::default(),
        }
    }

    /// Limits concurrent bursts.  A value of zero is treated as one.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    pub fn hold_active(&self) -> bool {
        self.hold.as_ref().is_some_and(HoldTicker::is_active)
    }

    /// Bursts that have been spawned and not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Acts on one effect.  Must be called from within a Tokio runtime.
    pub fn handle(&mut self, effect: GestureEffect) {
        match effect {
            GestureEffect::Burst { raw, target, count } => {
                info!(
                    "touch released at raw ({}, {}), replaying at {target}",
                    raw.x, raw.y
                );
                self.spawn_burst(target, count);
            }
            GestureEffect::Debounced { raw, since_last } => {
                self.stats.debounced += 1;
                info!(
                    ?since_last,
                    "touch released at raw ({}, {}) inside debounce window, not replayed",
                    raw.x, raw.y
                );
            }
            GestureEffect::Discarded => {
                self.stats.discarded += 1;
                info!("touch released without a full coordinate pair, not replayed");
            }
            GestureEffect::HoldStarted { target } => self.start_hold(target),
            GestureEffect::TargetMoved(target) => {
                if let Some(hold) = &self.hold {
                    hold.retarget(target);
                }
            }
            GestureEffect::HoldStopped => {
                if self.stop_hold() {
                    info!("touch released, replay stopped");
                }
            }
        }
    }

    /// Cancels the hold ticker, if any.  No new tap starts after this returns.
    pub fn shutdown(&mut self) {
        if self.stop_hold() {
            info!("replay ticker cancelled");
        }
    }

    /// Waits for every spawned burst to finish.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                warn!("burst task ended abnormally: {e}");
            }
        }
    }

    /// Stops the hold ticker and every in-flight burst without waiting for
    /// them to complete.  Dropping a burst task drops its `adb` child, which
    /// is killed.
    pub async fn abort(&mut self) {
        if let Some(hold) = self.hold.take() {
            hold.abort();
            info!("replay ticker aborted");
        }
        if self.in_flight.is_empty() {
            return;
        }

        self.in_flight.abort_all();
        let mut aborted = 0;
        while let Some(joined) = self.in_flight.join_next().await {
            match joined {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => aborted += 1,
                Err(e) => warn!("burst task ended abnormally: {e}"),
            }
        }
        self.stats.bursts_aborted += aborted;
        if aborted > 0 {
            warn!(bursts = aborted, "in-flight replays aborted");
        }
    }

    fn spawn_burst(&mut self, target: ScaledPoint, count: u32) {
        self.reap_finished();
        if self.in_flight.len() >= self.max_in_flight {
            self.stats.bursts_skipped += 1;
            warn!(
                in_flight = self.in_flight.len(),
                "too many bursts in flight, skipping replay at {target}"
            );
            return;
        }

        let sink = Arc::clone(&self.sink);
        self.in_flight.spawn(async move {
            match sink.tap(target, count).await {
                Ok(()) => info!("replayed tap {count} times at {target}"),
                Err(e) => error!("replay at {target} failed: {e}"),
            }
        });
        self.stats.bursts_started += 1;
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            if let Err(e) = joined {
                warn!("burst task ended abnormally: {e}");
            }
        }
    }

    fn start_hold(&mut self, target: Option<ScaledPoint>) {
        let ReplayPolicy::Hold { interval } = self.policy else {
            warn!("hold start received under the {} policy", self.policy.name());
            return;
        };
        // A lost touch-up must not leave two tickers running.
        self.stop_hold();

        self.hold = Some(HoldTicker::start(Arc::clone(&self.sink), interval, target));
        self.stats.holds_started += 1;
        info!(interval_ms = interval_millis(interval), "touch down, replaying while held");
    }

    fn stop_hold(&mut self) -> bool {
        match self.hold.take() {
            Some(mut hold) => hold.cancel(),
            None => false,
        }
    }
}

fn interval_millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
