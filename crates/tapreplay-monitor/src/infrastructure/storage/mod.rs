//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory (or an explicit path), fills in defaults
//! for anything missing, and validates the values into the core types the
//! rest of the monitor is built from.

pub mod config;
