//! # tapreplay-core
//!
//! Shared library for TapReplay containing the raw event line protocol,
//! coordinate scaling, and the gesture state machine.
//!
//! This crate has zero dependencies on OS APIs, child processes, or an async
//! runtime.  Everything here can be driven from a unit test with plain strings
//! and hand-made [`std::time::Instant`] values.
//!
//! # Architecture overview (for beginners)
//!
//! TapReplay watches a touchscreen through `getevent -l` (a debugging tool that
//! prints every kernel input event as a line of text) and replays the taps it
//! sees through `input tap X Y`.  The touch sensor reports positions in its own
//! raw range (for example `0..=4095`) while `input tap` expects display pixels,
//! so every replayed point has to be rescaled.
//!
//! - **`protocol`** – How bytes from the event tap become typed events.  The
//!   framer splits the byte stream into lines; the classifier turns each line
//!   into a [`LineEvent`].
//!
//! - **`domain`** – Pure business logic.  [`ScreenGeometry`] maps raw sensor
//!   coordinates to screen pixels and [`GestureTracker`] reconstructs touch
//!   gestures from the classified stream and decides when a replay fires.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `tapreplay_core::GestureTracker` instead of the full module path.
pub use domain::geometry::{GeometryError, RawPoint, ScaledPoint, ScreenGeometry};
pub use domain::gesture::{
    ContactState, GestureEffect, GestureTracker, PolicyError, ReplayPolicy, SampleScope,
};
pub use protocol::framing::LineFramer;
pub use protocol::line::{classify, classify_line, Axis, LineDialect, LineEvent, RawSample};
