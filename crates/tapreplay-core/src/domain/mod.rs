//! Domain entities for TapReplay.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What lives here? (for beginners)
//!
//! - [`geometry`] – the mapping from the touch sensor's raw coordinate range
//!   to the pixel grid of the display that receives replayed taps.
//! - [`gesture`] – the state machine that turns an ordered stream of axis
//!   samples and contact markers into gestures, and decides (according to the
//!   configured [`gesture::ReplayPolicy`]) when a replay must happen.
//!
//! Code in outer layers (the monitor binary, process adapters) depends on the
//! domain, but the domain never depends on them.

/// Raw sensor range to display pixel scaling.
pub mod geometry;

/// Touch gesture reconstruction and replay policy.
pub mod gesture;
