//! StreamPump: the read loop between the event source and the replay driver.
//!
//! ```text
//!  AsyncRead ──bytes──▶ LineFramer ──lines──▶ classify ──events──▶ GestureTracker
//!                                                                       │ effects
//!                                                                       ▼
//!                                                                 ReplayDriver
//! ```
//!
//! Everything on this path runs sequentially on the pump's task, so lines are
//! applied in exactly the order they were read.  The only concurrency lives
//! behind the driver (burst tasks and the hold ticker).

use std::future::Future;
use std::io;

use tapreplay_core::{classify, GestureEffect, GestureTracker, LineDialect, LineEvent, LineFramer};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::application::replay_taps::ReplayDriver;

/// Bytes requested per read from the source.
const READ_CHUNK: usize = 4096;

/// Why [`StreamPump::run`] returned.
#[derive(Debug)]
pub enum PumpOutcome {
    /// The source closed its output.
    EndOfStream,
    /// The shutdown future resolved first.
    Interrupted,
    /// Reading from the source failed.
    ReadFailed(io::Error),
}

/// Counters describing one pump run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpStats {
    /// Complete lines processed, including the unterminated final one.
    pub lines: u64,
    /// Lines classified as noise.
    pub ignored: u64,
    /// Contacts started.
    pub gestures: u64,
    /// Bursts triggered plus holds started.
    pub replays: u64,
}

/// Owns the tracker and driver for the lifetime of one event stream.
pub struct StreamPump {
    tracker: GestureTracker,
    dialect: LineDialect,
    driver: ReplayDriver,
    framer: LineFramer,
    stats: PumpStats,
}

impl StreamPump {
    pub fn new(tracker: GestureTracker, dialect: LineDialect, driver: ReplayDriver) -> Self {
        Self {
            tracker,
            dialect,
            driver,
            framer: LineFramer::new(),
            stats: PumpStats::default(),
        }
    }

    pub fn stats(&self) -> PumpStats {
        PumpStats {
            gestures: self.tracker.gestures(),
            ..self.stats
        }
    }

    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }

    pub fn driver(&self) -> &ReplayDriver {
        &self.driver
    }

    /// Reads `reader` until end of stream, a read error, or `shutdown`
    /// resolving, whichever comes first.
    ///
    /// Before returning, any active hold is cancelled.  At end of stream the
    /// in-flight bursts are awaited; on interruption or a read failure they
    /// are aborted so shutdown never waits on a slow `adb`.
    pub async fn run<R, S>(&mut self, mut reader: R, shutdown: S) -> PumpOutcome
    where
        R: AsyncRead + Unpin,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut buf = vec![0u8; READ_CHUNK];

        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break PumpOutcome::Interrupted,
                read = reader.read(&mut buf) => match read {
                    Ok(0) => {
                        if let Some(line) = self.framer.finish() {
                            debug!("processing unterminated final line");
                            self.process_line(&line);
                        }
                        break PumpOutcome::EndOfStream;
                    }
                    Ok(n) => {
                        for line in self.framer.push(&buf[..n]) {
                            self.process_line(&line);
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => break PumpOutcome::ReadFailed(e),
                },
            }
        };

        if self.tracker.reset() {
            debug!("contact was still down when the stream stopped");
        }
        if matches!(outcome, PumpOutcome::EndOfStream) {
            self.driver.shutdown();
            self.driver.drain().await;
        } else {
            self.driver.abort().await;
        }

        let stats = self.stats();
        match &outcome {
            PumpOutcome::EndOfStream => info!(
                lines = stats.lines,
                gestures = stats.gestures,
                replays = stats.replays,
                "event stream ended"
            ),
            PumpOutcome::Interrupted => info!(
                lines = stats.lines,
                gestures = stats.gestures,
                replays = stats.replays,
                "monitor interrupted"
            ),
            PumpOutcome::ReadFailed(e) => warn!("reading the event stream failed: {e}"),
        }
        outcome
    }

    fn process_line(&mut self, line: &str) {
        self.stats.lines += 1;

        let event = classify(line, self.dialect);
        if event == LineEvent::Ignored {
            self.stats.ignored += 1;
            trace!(line, "ignored");
            return;
        }

        // Tokio's clock so paused-time tests drive the debounce window too.
        let now = Instant::now().into_std();
        let Some(effect) = self.tracker.apply(event, now) else {
            return;
        };
        if matches!(
            effect,
            GestureEffect::Burst { .. } | GestureEffect::HoldStarted { .. }
        ) {
            self.stats.replays += 1;
        }
        self.driver.handle(effect);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::tap_injection::mock::RecordingTapSink;
    use std::sync::Arc;
    use std::time::Duration;
    use tapreplay_core::{ReplayPolicy, ScaledPoint, ScreenGeometry};

    fn burst_pump(sink: Arc<RecordingTapSink>) -> StreamPump {
        let policy = ReplayPolicy::default();
        StreamPump::new(
            GestureTracker::new(ScreenGeometry::default(), policy),
            LineDialect::Strict,
            ReplayDriver::new(sink, policy),
        )
    }

    #[tokio::test]
    async fn test_end_of_stream_on_empty_input() {
        // Arrange
        let sink = Arc::new(RecordingTapSink::new());
        let mut pump = burst_pump(sink.clone());

        // Act
        let outcome = pump.run(tokio::io::empty(), std::future::pending()).await;

        // Assert
        assert!(matches!(outcome, PumpOutcome::EndOfStream));
        assert_eq!(pump.stats(), PumpStats::default());
        assert!(sink.taps().is_empty());
    }

    #[tokio::test]
    async fn test_counts_lines_ignored_gestures_and_replays() {
        let input: &[u8] = b"add device 1: /dev/input/event3\n\
            EV_KEY       BTN_TOUCH            DOWN\n\
            EV_ABS       ABS_MT_POSITION_X    00000800\n\
            EV_ABS       ABS_MT_POSITION_Y    00000400\n\
            EV_SYN       SYN_REPORT           00000000\n\
            EV_KEY       BTN_TOUCH            UP\n";
        let sink = Arc::new(RecordingTapSink::new());
        let mut pump = burst_pump(sink.clone());

        pump.run(input, std::future::pending()).await;

        assert_eq!(
            pump.stats(),
            PumpStats {
                lines: 6,
                ignored: 2,
                gestures: 1,
                replays: 1,
            }
        );
        assert_eq!(sink.taps(), vec![(ScaledPoint { x: 540, y: 600 }, 20)]);
    }

    #[tokio::test]
    async fn test_unterminated_final_line_is_processed() {
        let input: &[u8] = b"EV_KEY BTN_TOUCH DOWN\n\
            EV_ABS ABS_MT_POSITION_X 00000000\n\
            EV_ABS ABS_MT_POSITION_Y 00000000\n\
            EV_KEY BTN_TOUCH UP";
        let sink = Arc::new(RecordingTapSink::new());
        let mut pump = burst_pump(sink.clone());

        pump.run(input, std::future::pending()).await;

        assert_eq!(sink.taps(), vec![(ScaledPoint { x: 0, y: 0 }, 20)]);
        assert_eq!(pump.stats().lines, 4);
    }

    #[tokio::test]
    async fn test_read_error_is_reported_after_cleanup() {
        // Arrange
        let reader = tokio_test::io::Builder::new()
            .read(b"EV_KEY BTN_TOUCH DOWN\n")
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
            .build();
        let sink = Arc::new(RecordingTapSink::new());
        let mut pump = burst_pump(sink.clone());

        // Act
        let outcome = pump.run(reader, std::future::pending()).await;

        // Assert – the half-finished contact is dropped, nothing replayed
        match outcome {
            PumpOutcome::ReadFailed(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected ReadFailed, got {other:?}"),
        }
        assert!(sink.taps().is_empty());
        assert_eq!(pump.tracker().last_sample(), (None, None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wins_over_idle_reader() {
        let reader = tokio_test::io::Builder::new()
            .wait(Duration::from_secs(3600))
            .build();
        let sink = Arc::new(RecordingTapSink::new());
        let mut pump = burst_pump(sink);

        let outcome = pump
            .run(reader, tokio::time::sleep(Duration::from_millis(5)))
            .await;

        assert!(matches!(outcome, PumpOutcome::Interrupted));
    }
}
