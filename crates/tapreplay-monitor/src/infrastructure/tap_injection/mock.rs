//! Recording tap sink for testing.
//!
//! `RecordingTapSink` replaces `adb` with in-memory recording.  Each
//! successful injection is pushed into a `Mutex<Vec<...>>` so test assertions
//! can inspect exactly which taps were issued and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let sink = Arc::new(RecordingTapSink::new());
//! let mut driver = ReplayDriver::new(sink.clone(), ReplayPolicy::default());
//!
//! driver.handle(effect);
//! driver.drain().await;
//!
//! assert_eq!(sink.taps(), vec![(ScaledPoint { x: 540, y: 600 }, 20)]);
//! ```
//!
//! # `should_fail` flag
//!
//! A sink built with [`RecordingTapSink::failing`] counts every attempt but
//! returns `InjectionError::Platform` instead of recording it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tapreplay_core::ScaledPoint;

use crate::application::replay_taps::{InjectionError, TapSink};

/// A sink that records all taps without injecting anything.
#[derive(Default)]
pub struct RecordingTapSink {
    /// Each `(point, repeat)` pair passed to a successful `tap`.
    pub taps: Mutex<Vec<(ScaledPoint, u32)>>,
    /// Calls to `tap`, successful or not.
    pub attempts: AtomicUsize,
    /// When `true`, every call returns an error.
    pub should_fail: bool,
    /// Simulated injection latency.
    pub delay: Option<Duration>,
}

impl RecordingTapSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Makes each `tap` take `delay` (on the Tokio clock) before recording.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Snapshot of the recorded taps.
    pub fn taps(&self) -> Vec<(ScaledPoint, u32)> {
        self.taps.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TapSink for RecordingTapSink {
    async fn tap(&self, point: ScaledPoint, repeat: u32) -> Result<(), InjectionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(InjectionError::Platform("injected failure".to_string()));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Ok(mut taps) = self.taps.lock() {
            taps.push((point, repeat));
        }
        Ok(())
    }
}
