//! Raw sensor coordinates to display pixel scaling.
//!
//! The touch controller reports absolute positions in a fixed raw range
//! (`0..=raw_max` on both axes) that is unrelated to the display resolution.
//! [`ScreenGeometry::scale`] maps a raw pair onto the display's pixel grid:
//!
//! ```text
//! screen_x = round(raw_x * screen_width  / raw_max)
//! screen_y = round(raw_y * screen_height / raw_max)
//! ```
//!
//! Rounding is half away from zero (all inputs are non-negative, so this is
//! "half up").  The division is done in exact 64-bit integer arithmetic, so
//! the result never depends on floating-point representation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building a [`ScreenGeometry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// A zero raw maximum would make every division undefined.
    #[error("raw coordinate maximum must be greater than zero")]
    ZeroRawMax,

    /// A zero-sized screen cannot receive taps.
    #[error("screen dimensions must be non-zero, got {width}x{height}")]
    EmptyScreen { width: u32, height: u32 },
}

/// A raw coordinate pair as reported by the touch sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawPoint {
    pub x: u32,
    pub y: u32,
}

/// A coordinate pair in the target display's pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaledPoint {
    pub x: u32,
    pub y: u32,
}

impl std::fmt::Display for ScaledPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fixed raw range and display resolution used for every scaling operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    raw_max: u32,
    screen_width: u32,
    screen_height: u32,
    clamp: bool,
}

impl ScreenGeometry {
    /// Creates a geometry that passes out-of-range raw values through unclamped.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroRawMax`] if `raw_max` is zero and
    /// [`GeometryError::EmptyScreen`] if either screen dimension is zero.
    pub fn new(raw_max: u32, screen_width: u32, screen_height: u32) -> Result<Self, GeometryError> {
        if raw_max == 0 {
            return Err(GeometryError::ZeroRawMax);
        }
        if screen_width == 0 || screen_height == 0 {
            return Err(GeometryError::EmptyScreen {
                width: screen_width,
                height: screen_height,
            });
        }
        Ok(Self {
            raw_max,
            screen_width,
            screen_height,
            clamp: false,
        })
    }

    /// Returns a copy that clamps raw values to `0..=raw_max` before scaling,
    /// so every result lands inside the screen.
    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn raw_max(&self) -> u32 {
        self.raw_max
    }

    pub fn screen_width(&self) -> u32 {
        self.screen_width
    }

    pub fn screen_height(&self) -> u32 {
        self.screen_height
    }

    pub fn clamps(&self) -> bool {
        self.clamp
    }

    /// Maps a raw sensor pair to display pixels, each axis independently.
    pub fn scale(&self, raw_x: u32, raw_y: u32) -> ScaledPoint {
        ScaledPoint {
            x: self.scale_axis(raw_x, self.screen_width),
            y: self.scale_axis(raw_y, self.screen_height),
        }
    }

    /// Convenience wrapper around [`ScreenGeometry::scale`] for a [`RawPoint`].
    pub fn scale_point(&self, raw: RawPoint) -> ScaledPoint {
        self.scale(raw.x, raw.y)
    }

    fn scale_axis(&self, raw: u32, dimension: u32) -> u32 {
        let raw = if self.clamp { raw.min(self.raw_max) } else { raw };
        let max = u128::from(self.raw_max);
        // round(raw * dim / max) == floor((2 * raw * dim + max) / (2 * max))
        let numerator = 2 * u128::from(raw) * u128::from(dimension) + max;
        let scaled = numerator / (2 * max);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }
}

impl Default for ScreenGeometry {
    /// 1080x2400 display behind a 12-bit (`0..=4095`) touch controller.
    fn default() -> Self {
        Self {
            raw_max: 4095,
            screen_width: 1080,
            screen_height: 2400,
            clamp: false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
