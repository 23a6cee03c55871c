//! Gesture reconstruction from the classified event stream.
//!
//! The raw protocol interleaves axis samples and contact markers without an
//! explicit "event complete" delimiter.  [`GestureTracker`] rebuilds gesture
//! boundaries from `BTN_TOUCH DOWN` / `BTN_TOUCH UP` and buffers the latest
//! known coordinate pair until a boundary fires.
//!
//! ```text
//!             TouchDown
//!   ┌──────┐ ─────────────▶ ┌──────┐ ◀─┐ XSample / YSample
//!   │ Idle │                │ Down │ ──┘ (update last_x / last_y)
//!   └──────┘ ◀───────────── └──────┘
//!              TouchUp
//! ```
//!
//! The tracker never performs I/O.  It returns a [`GestureEffect`] describing
//! what the replay driver should do; the caller decides how to act on it.
//!
//! # Replay policies
//!
//! - [`ReplayPolicy::Burst`] – on touch-up, if both axes are known and the
//!   debounce window since the previous replay has elapsed, emit one
//!   [`GestureEffect::Burst`] carrying the scaled target and repeat count.
//! - [`ReplayPolicy::Hold`] – on touch-down emit [`GestureEffect::HoldStarted`],
//!   keep the driver informed of the latest target with
//!   [`GestureEffect::TargetMoved`], and emit [`GestureEffect::HoldStopped`]
//!   on touch-up.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::domain::geometry::{RawPoint, ScaledPoint, ScreenGeometry};
use crate::protocol::line::{Axis, LineEvent};

/// Repeat count used by the default burst policy.
pub const DEFAULT_REPLAY_COUNT: u32 = 20;

/// Errors raised when building a [`ReplayPolicy`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("burst replay count must be at least 1")]
    ZeroCount,

    #[error("hold tick interval must be greater than zero")]
    ZeroInterval,
}

/// How detected gestures are replayed.  Exactly one policy is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPolicy {
    /// Replay once per gesture on touch-up, as a burst of `count` taps.
    Burst { count: u32, debounce: Duration },
    /// Tap once per `interval` for as long as the contact is held.
    Hold { interval: Duration },
}

impl ReplayPolicy {
    /// # Errors
    ///
    /// Returns [`PolicyError::ZeroCount`] when `count` is zero.
    pub fn burst(count: u32, debounce: Duration) -> Result<Self, PolicyError> {
        if count == 0 {
            return Err(PolicyError::ZeroCount);
        }
        Ok(Self::Burst { count, debounce })
    }

    /// # Errors
    ///
    /// Returns [`PolicyError::ZeroInterval`] when `interval` is zero.
    pub fn hold(interval: Duration) -> Result<Self, PolicyError> {
        if interval.is_zero() {
            return Err(PolicyError::ZeroInterval);
        }
        Ok(Self::Hold { interval })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReplayPolicy::Burst { .. } => "burst",
            ReplayPolicy::Hold { .. } => "hold",
        }
    }
}

impl Default for ReplayPolicy {
    /// Burst of 20 taps with a 40 ms debounce window (two milliseconds per tap).
    fn default() -> Self {
        Self::Burst {
            count: DEFAULT_REPLAY_COUNT,
            debounce: Duration::from_millis(u64::from(DEFAULT_REPLAY_COUNT) * 2),
        }
    }
}

/// Which axis samples count towards a gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleScope {
    /// Only samples reported between touch-down and touch-up are kept.
    /// Samples seen while idle are dropped, and the pair is cleared when a
    /// contact starts.
    #[default]
    ContactOnly,
    /// Samples seen while idle are kept and carried into the next contact.
    /// Kernel drivers usually report the first position of a contact in the
    /// same frame as, and before, `BTN_TOUCH DOWN`.
    CarryPreContact,
}

/// Whether a finger is currently on the sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContactState {
    #[default]
    Idle,
    Down,
}

/// What the replay driver must do in response to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEffect {
    /// Start the periodic replay.  `target` is known if samples were carried in.
    HoldStarted { target: Option<ScaledPoint> },
    /// Both axes are known and the held contact's target changed.
    TargetMoved(ScaledPoint),
    /// Stop the periodic replay.
    HoldStopped,
    /// Replay `count` taps at `target` once.
    Burst {
        raw: RawPoint,
        target: ScaledPoint,
        count: u32,
    },
    /// The gesture completed inside the debounce window and is not replayed.
    Debounced { raw: RawPoint, since_last: Duration },
    /// The gesture ended without a complete coordinate pair.
    Discarded,
}

/// Single-contact gesture state machine.
#[derive(Debug)]
pub struct GestureTracker {
    geometry: ScreenGeometry,
    policy: ReplayPolicy,
    scope: SampleScope,
    contact: ContactState,
    last_x: Option<u32>,
    last_y: Option<u32>,
    last_replay: Option<Instant>,
    gestures: u64,
}

impl GestureTracker {
    pub fn new(geometry: ScreenGeometry, policy: ReplayPolicy) -> Self {
        Self {
            geometry,
            policy,
            scope: SampleScope::default(),
            contact: ContactState::Idle,
            last_x: None,
            last_y: None,
            last_replay: None,
            gestures: 0,
        }
    }

    pub fn with_sample_scope(mut self, scope: SampleScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn geometry(&self) -> &ScreenGeometry {
        &self.geometry
    }

    pub fn policy(&self) -> ReplayPolicy {
        self.policy
    }

    pub fn contact(&self) -> ContactState {
        self.contact
    }

    /// Latest known raw `(x, y)`; either side is `None` when unknown.
    pub fn last_sample(&self) -> (Option<u32>, Option<u32>) {
        (self.last_x, self.last_y)
    }

    /// Number of contacts started so far.
    pub fn gestures(&self) -> u64 {
        self.gestures
    }

    /// The point a hold tick fires at right now: the scaled pair while a
    /// contact is down and both axes are known.
    pub fn tick_target(&self) -> Option<ScaledPoint> {
        match self.contact {
            ContactState::Down => self.current_target(),
            ContactState::Idle => None,
        }
    }

    /// Applies one classified line at time `now`.
    pub fn apply(&mut self, event: LineEvent, now: Instant) -> Option<GestureEffect> {
        match (self.contact, event) {
            (_, LineEvent::Ignored) => None,
            (ContactState::Idle, LineEvent::TouchDown) => self.begin_contact(),
            (ContactState::Down, LineEvent::TouchDown) => {
                trace!("touch-down while already down ignored");
                None
            }
            (ContactState::Down, LineEvent::TouchUp) => self.end_contact(now),
            (ContactState::Idle, LineEvent::TouchUp) => {
                trace!("touch-up without contact ignored");
                None
            }
            (_, LineEvent::XSample(value)) => self.record(Axis::X, value),
            (_, LineEvent::YSample(value)) => self.record(Axis::Y, value),
        }
    }

    /// Forces the tracker back to idle, forgetting any buffered samples.
    ///
    /// Returns `true` if a contact was active.
    pub fn reset(&mut self) -> bool {
        let was_down = self.contact == ContactState::Down;
        self.contact = ContactState::Idle;
        self.clear_samples();
        was_down
    }

    fn begin_contact(&mut self) -> Option<GestureEffect> {
        self.contact = ContactState::Down;
        self.gestures += 1;
        if self.scope == SampleScope::ContactOnly {
            self.clear_samples();
        }
        debug!(gesture = self.gestures, "touch down");

        match self.policy {
            ReplayPolicy::Hold { .. } => Some(GestureEffect::HoldStarted {
                target: self.current_target(),
            }),
            ReplayPolicy::Burst { .. } => None,
        }
    }

    fn end_contact(&mut self, now: Instant) -> Option<GestureEffect> {
        self.contact = ContactState::Idle;
        let raw = self.raw_pair();
        self.clear_samples();
        debug!(gesture = self.gestures, ?raw, "touch up");

        match self.policy {
            ReplayPolicy::Hold { .. } => Some(GestureEffect::HoldStopped),
            ReplayPolicy::Burst { count, debounce } => {
                let Some(raw) = raw else {
                    return Some(GestureEffect::Discarded);
                };
                if let Some(last) = self.last_replay {
                    let since_last = now.saturating_duration_since(last);
                    if since_last <= debounce {
                        return Some(GestureEffect::Debounced { raw, since_last });
                    }
                }
                self.last_replay = Some(now);
                Some(GestureEffect::Burst {
                    raw,
                    target: self.geometry.scale_point(raw),
                    count,
                })
            }
        }
    }

    fn record(&mut self, axis: Axis, value: u32) -> Option<GestureEffect> {
        if self.contact == ContactState::Idle && self.scope == SampleScope::ContactOnly {
            trace!(?axis, value, "sample outside contact dropped");
            return None;
        }

        match axis {
            Axis::X => self.last_x = Some(value),
            Axis::Y => self.last_y = Some(value),
        }

        match (self.contact, self.policy) {
            (ContactState::Down, ReplayPolicy::Hold { .. }) => {
                self.current_target().map(GestureEffect::TargetMoved)
            }
            _ => None,
        }
    }

    fn raw_pair(&self) -> Option<RawPoint> {
        Some(RawPoint {
            x: self.last_x?,
            y: self.last_y?,
        })
    }

    fn current_target(&self) -> Option<ScaledPoint> {
        self.raw_pair().map(|raw| self.geometry.scale_point(raw))
    }

    fn clear_samples(&mut self) {
        self.last_x = None;
        self.last_y = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
