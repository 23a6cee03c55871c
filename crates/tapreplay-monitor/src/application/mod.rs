//! Application layer use cases for the monitor.
//!
//! - **`replay_taps`** – Turns [`tapreplay_core::GestureEffect`]s into tap
//!   injections.  The actual injection is done by a [`replay_taps::TapSink`]
//!   implementation that is injected at construction time.
//!
//! - **`hold_ticker`** – The cancellable periodic task behind the
//!   continuous-while-held policy.
//!
//! - **`monitor`** – The stream pump: bytes in, lines classified and applied
//!   in order, effects forwarded to the replay driver.

pub mod hold_ticker;
pub mod monitor;
pub mod replay_taps;
