//! tapreplay-monitor library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the monitor do? (for beginners)
//!
//! 1. Spawns `adb shell getevent -l <device>` and reads its standard output.
//! 2. Splits the output into lines and classifies each line (axis sample,
//!    touch down, touch up, or noise) using `tapreplay_core`.
//! 3. Feeds the classified events to a `GestureTracker`, which decides when a
//!    tap should be replayed and where (in display pixels).
//! 4. Hands those decisions to the `ReplayDriver`, which runs
//!    `adb shell input tap X Y` either as a burst on release or periodically
//!    while the finger is held down.
//! 5. On end of stream or Ctrl-C, cancels pending ticks, stops the child
//!    process, and reports its stderr and exit status.

/// Application layer: replay driver, hold ticker, and the stream pump.
pub mod application;

/// Infrastructure layer: child processes, tap injection adapters, config file.
pub mod infrastructure;
