//! Infrastructure layer for the monitor.
//!
//! Contains the OS-facing adapters: child processes, tap injection, and the
//! configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `tapreplay_core`, but MUST NOT be imported by the `application` layer
//! (outside of its tests) or by the core crate.
//!
//! # Sub-modules
//!
//! - **`event_source`** – Spawns `adb shell getevent -l` (or a configured
//!   command) and hands its stdout to the stream pump.  Collects stderr and
//!   the exit status for the final report.
//!
//! - **`tap_injection`** – Implementations of `TapSink`: the adb-backed sink,
//!   a dry-run sink that only logs, and a recording sink for tests.
//!
//! - **`storage`** – The TOML configuration file.

pub mod event_source;
pub mod storage;
pub mod tap_injection;
