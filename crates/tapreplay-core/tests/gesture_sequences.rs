//! Integration tests for the tapreplay-core pipeline.
//!
//! These tests push recorded `getevent -l` transcripts through the public API
//! (framer, classifier, tracker) and check the effects that come out the other
//! end, exercising all three components together.

use std::time::{Duration, Instant};

use tapreplay_core::{
    classify, GestureEffect, GestureTracker, LineDialect, LineFramer, ReplayPolicy, ScaledPoint,
    ScreenGeometry,
};

/// One tap as printed by `getevent -l /dev/input/event3` on the reference device.
const TAP_TRANSCRIPT: &str = "\
EV_ABS       ABS_MT_TRACKING_ID   00000e2c
EV_KEY       BTN_TOUCH            DOWN
EV_ABS       ABS_MT_POSITION_X    00000800
EV_ABS       ABS_MT_POSITION_Y    00000400
EV_ABS       ABS_MT_TOUCH_MAJOR   00000006
EV_SYN       SYN_REPORT           00000000
EV_ABS       ABS_MT_POSITION_X    000007ff
EV_SYN       SYN_REPORT           00000000
EV_ABS       ABS_MT_TRACKING_ID   ffffffff
EV_KEY       BTN_TOUCH            UP
EV_SYN       SYN_REPORT           00000000
";

fn run(bytes: &[u8], chunk: usize, tracker: &mut GestureTracker, now: Instant) -> Vec<GestureEffect> {
    let mut framer = LineFramer::new();
    let mut effects = Vec::new();
    for piece in bytes.chunks(chunk) {
        for line in framer.push(piece) {
            if let Some(effect) = tracker.apply(classify(&line, LineDialect::Strict), now) {
                effects.push(effect);
            }
        }
    }
    if let Some(line) = framer.finish() {
        if let Some(effect) = tracker.apply(classify(&line, LineDialect::Strict), now) {
            effects.push(effect);
        }
    }
    effects
}

fn burst_tracker() -> GestureTracker {
    GestureTracker::new(ScreenGeometry::default(), ReplayPolicy::default())
}

#[test]
fn test_transcript_produces_one_burst_at_last_sample() {
    let mut tracker = burst_tracker();

    let effects = run(TAP_TRANSCRIPT.as_bytes(), 4096, &mut tracker, Instant::now());

    // Last X is 0x7ff = 2047 -> 540, Y is 0x400 = 1024 -> 600.
    assert_eq!(effects.len(), 1);
    match effects[0] {
        GestureEffect::Burst { target, count, .. } => {
            assert_eq!(target, ScaledPoint { x: 540, y: 600 });
            assert_eq!(count, 20);
        }
        other => panic!("expected a burst, got {other:?}"),
    }
}

#[test]
fn test_chunk_boundaries_do_not_change_effects() {
    let now = Instant::now();
    let whole = run(TAP_TRANSCRIPT.as_bytes(), usize::MAX, &mut burst_tracker(), now);

    for chunk in [1, 2, 3, 7, 16, 61] {
        let split = run(TAP_TRANSCRIPT.as_bytes(), chunk, &mut burst_tracker(), now);
        assert_eq!(split, whole, "chunk size {chunk} changed the outcome");
    }
}

#[test]
fn test_missing_final_newline_still_closes_gesture() {
    let unterminated = "EV_KEY BTN_TOUCH DOWN\nEV_ABS ABS_MT_POSITION_X 00000800\nEV_ABS ABS_MT_POSITION_Y 00000400\nEV_KEY BTN_TOUCH UP";

    let effects = run(unterminated.as_bytes(), 5, &mut burst_tracker(), Instant::now());

    assert!(matches!(effects.as_slice(), [GestureEffect::Burst { .. }]));
}

#[test]
fn test_crlf_transcript_matches_lf_transcript() {
    let crlf = TAP_TRANSCRIPT.replace('\n', "\r\n");
    let now = Instant::now();

    let lf_effects = run(TAP_TRANSCRIPT.as_bytes(), 9, &mut burst_tracker(), now);
    let crlf_effects = run(crlf.as_bytes(), 9, &mut burst_tracker(), now);

    assert_eq!(lf_effects, crlf_effects);
}

#[test]
fn test_two_taps_inside_debounce_window_replay_once() {
    let mut tracker = burst_tracker();
    let t0 = Instant::now();

    let first = run(TAP_TRANSCRIPT.as_bytes(), 64, &mut tracker, t0);
    let second = run(TAP_TRANSCRIPT.as_bytes(), 64, &mut tracker, t0 + Duration::from_millis(20));
    let third = run(TAP_TRANSCRIPT.as_bytes(), 64, &mut tracker, t0 + Duration::from_millis(100));

    assert!(matches!(first.as_slice(), [GestureEffect::Burst { .. }]));
    assert!(matches!(second.as_slice(), [GestureEffect::Debounced { .. }]));
    assert!(matches!(third.as_slice(), [GestureEffect::Burst { .. }]));
}

#[test]
fn test_hold_transcript_tracks_movement_then_stops() {
    let mut tracker = GestureTracker::new(
        ScreenGeometry::default(),
        ReplayPolicy::hold(Duration::from_millis(10)).unwrap(),
    );

    let effects = run(TAP_TRANSCRIPT.as_bytes(), 32, &mut tracker, Instant::now());

    assert_eq!(
        effects,
        vec![
            GestureEffect::HoldStarted { target: None },
            GestureEffect::TargetMoved(ScaledPoint { x: 540, y: 600 }),
            GestureEffect::TargetMoved(ScaledPoint { x: 540, y: 600 }),
            GestureEffect::HoldStopped,
        ]
    );
}

#[test]
fn test_malformed_sample_keeps_previous_value() {
    let transcript = "\
EV_KEY       BTN_TOUCH            DOWN
EV_ABS       ABS_MT_POSITION_X    00000800
EV_ABS       ABS_MT_POSITION_Y    00000400
EV_ABS       ABS_MT_POSITION_X    0000080
EV_ABS       ABS_MT_POSITION_Y    0000zz00
EV_KEY       BTN_TOUCH            UP
";
    let effects = run(transcript.as_bytes(), 11, &mut burst_tracker(), Instant::now());

    // 0x800 = 2048 -> 540, 0x400 = 1024 -> 600
    assert!(matches!(
        effects.as_slice(),
        [GestureEffect::Burst { target: ScaledPoint { x: 540, y: 600 }, .. }]
    ));
}
