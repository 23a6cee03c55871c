//! Cancellable periodic tap task for the continuous-while-held policy.
//!
//! A [`HoldTicker`] is started on touch-down and cancelled on touch-up or
//! shutdown.  While it runs, it taps once per interval at the latest target.
//!
//! # How the tick reads coordinates
//!
//! The gesture tracker lives on the pump task and is never shared.  Instead,
//! the replay driver publishes every new target into a
//! [`tokio::sync::watch`] channel and the tick task reads the current value
//! with `borrow()`.  A watch value is replaced as a whole, so a tick always
//! sees a complete `(x, y)` pair, never an X from one sample and a Y from
//! another.
//!
//! # Cancellation
//!
//! [`HoldTicker::cancel`] flips an `AtomicBool` and fires a `oneshot`.  The
//! flag is checked immediately before each injection, so once `cancel`
//! returns no new tap is started.  The `oneshot` wakes the task if it is
//! parked waiting for the next tick.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tapreplay_core::ScaledPoint;
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::application::replay_taps::TapSink;

/// Handle to a running periodic tap task.
pub struct HoldTicker {
    active: Arc<AtomicBool>,
    target_tx: watch::Sender<Option<ScaledPoint>>,
    cancel_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl HoldTicker {
    /// Spawns the tick task.  The first tap happens one `period` from now.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(sink: Arc<dyn TapSink>, period: Duration, target: Option<ScaledPoint>) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let (target_tx, target_rx) = watch::channel(target);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let handle = tokio::spawn(run_ticks(
            sink,
            period,
            target_rx,
            Arc::clone(&active),
            cancel_rx,
        ));

        Self {
            active,
            target_tx,
            cancel_tx: Some(cancel_tx),
            handle,
        }
    }

    /// Replaces the point the next tick fires at.
    pub fn retarget(&self, target: ScaledPoint) {
        self.target_tx.send_replace(Some(target));
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stops the ticker.  Returns `true` the first time only.
    pub fn cancel(&mut self) -> bool {
        self.active.store(false, Ordering::SeqCst);
        match self.cancel_tx.take() {
            Some(tx) => {
                // The task may already be gone; nothing to wake in that case.
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    /// Cancels the ticker and aborts a tap that is still in progress.
    pub fn abort(mut self) {
        self.cancel();
        self.handle.abort();
    }
}

impl Drop for HoldTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_ticks(
    sink: Arc<dyn TapSink>,
    period: Duration,
    target_rx: watch::Receiver<Option<ScaledPoint>>,
    active: Arc<AtomicBool>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    // A slow `input tap` must not cause a catch-up burst of ticks afterwards.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut fired: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = &mut cancel_rx => break,
            _ = ticker.tick() => {}
        }

        if !active.load(Ordering::SeqCst) {
            break;
        }

        let target = *target_rx.borrow();
        let Some(point) = target else {
            debug!("hold tick skipped: coordinates not known yet");
            continue;
        };

        fired += 1;
        if let Err(e) = sink.tap(point, 1).await {
            warn!("hold tick at {point} failed: {e}");
        }
    }

    debug!(ticks = fired, "hold ticker stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::tap_injection::mock::RecordingTapSink;

    const PERIOD: Duration = Duration::from_millis(10);

    fn point(x: u32, y: u32) -> ScaledPoint {
        ScaledPoint { x, y }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period_at_target() {
        // Arrange
        let sink = Arc::new(RecordingTapSink::new());
        let mut ticker = HoldTicker::start(sink.clone(), PERIOD, Some(point(5, 6)));

        // Act – 10 ms and 20 ms ticks fall inside the window
        tokio::time::sleep(Duration::from_millis(25)).await;
        ticker.cancel();

        // Assert
        assert_eq!(sink.taps(), vec![(point(5, 6), 1), (point(5, 6), 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_fires_before_first_period() {
        let sink = Arc::new(RecordingTapSink::new());
        let _ticker = HoldTicker::start(sink.clone(), PERIOD, Some(point(1, 1)));

        tokio::time::sleep(Duration::from_millis(9)).await;

        assert!(sink.taps().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_with_unknown_target_are_skipped() {
        // Arrange
        let sink = Arc::new(RecordingTapSink::new());
        let ticker = HoldTicker::start(sink.clone(), PERIOD, None);

        // Act – two silent ticks, then coordinates arrive
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(sink.taps().is_empty());
        ticker.retarget(point(7, 8));
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Assert – only the 30 ms tick fired
        assert_eq!(sink.taps(), vec![(point(7, 8), 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retarget_moves_subsequent_ticks() {
        let sink = Arc::new(RecordingTapSink::new());
        let ticker = HoldTicker::start(sink.clone(), PERIOD, Some(point(1, 1)));

        tokio::time::sleep(Duration::from_millis(15)).await;
        ticker.retarget(point(2, 2));
        assert_eq!(*ticker.target_tx.borrow(), Some(point(2, 2)));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(sink.taps(), vec![(point(1, 1), 1), (point(2, 2), 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tap_after_cancel() {
        // Arrange
        let sink = Arc::new(RecordingTapSink::new());
        let mut ticker = HoldTicker::start(sink.clone(), PERIOD, Some(point(3, 3)));
        tokio::time::sleep(Duration::from_millis(15)).await;

        // Act
        assert!(ticker.cancel());
        let at_cancel = sink.taps().len();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Assert
        assert_eq!(sink.taps().len(), at_cancel);
        assert!(!ticker.is_active());
        assert!(ticker.handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reports_true_only_once() {
        let sink = Arc::new(RecordingTapSink::new());
        let mut ticker = HoldTicker::start(sink, PERIOD, None);

        assert!(ticker.cancel());
        assert!(!ticker.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_ticker() {
        let sink = Arc::new(RecordingTapSink::new());
        let ticker = HoldTicker::start(sink.clone(), PERIOD, Some(point(4, 4)));

        drop(ticker);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(sink.taps().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_sink_keeps_ticking() {
        let sink = Arc::new(RecordingTapSink::failing());
        let mut ticker = HoldTicker::start(sink.clone(), PERIOD, Some(point(9, 9)));

        tokio::time::sleep(Duration::from_millis(35)).await;
        ticker.cancel();

        assert_eq!(sink.attempts(), 3);
    }
}
