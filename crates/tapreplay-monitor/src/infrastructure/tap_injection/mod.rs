//! Tap injection implementations of [`TapSink`](crate::application::replay_taps::TapSink).
//!
//! - `adb` – runs `adb shell input tap` on the device.
//! - `dry_run` – logs the taps it would inject (`--dry-run`).
//! - `mock` – records calls in memory for tests.

pub mod adb;
pub mod dry_run;
pub mod mock;
