//! Criterion benchmarks for the line hot path.
//!
//! `getevent` emits several hundred lines per second while a finger moves, and
//! every one of them is framed, classified, and applied on the read loop.
//! These benchmarks keep an eye on the per-line cost.
//!
//! Run with:
//! ```bash
//! cargo bench --package tapreplay-core --bench line_bench
//! ```

use std::time::Instant;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tapreplay_core::{
    classify, GestureTracker, LineDialect, LineFramer, ReplayPolicy, ScreenGeometry,
};

// ── Representative lines ──────────────────────────────────────────────────────

const LINES: &[&str] = &[
    "EV_ABS       ABS_MT_TRACKING_ID   00000e2c",
    "EV_KEY       BTN_TOUCH            DOWN",
    "EV_ABS       ABS_MT_POSITION_X    00000800",
    "EV_ABS       ABS_MT_POSITION_Y    00000400",
    "EV_ABS       ABS_MT_TOUCH_MAJOR   00000006",
    "EV_SYN       SYN_REPORT           00000000",
    "EV_KEY       BTN_TOUCH            UP",
];

fn transcript(repeats: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for _ in 0..repeats {
        for line in LINES {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
    }
    out
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for dialect in [LineDialect::Strict, LineDialect::Lenient] {
        group.bench_with_input(
            BenchmarkId::new("mixed_lines", format!("{dialect:?}")),
            &dialect,
            |b, &dialect| {
                b.iter(|| {
                    LINES
                        .iter()
                        .map(|line| classify(black_box(line), dialect))
                        .count()
                })
            },
        );
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for chunk in [16usize, 512, 4096] {
        let bytes = transcript(100);
        group.bench_with_input(BenchmarkId::new("frame_classify_apply", chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut framer = LineFramer::new();
                let mut tracker =
                    GestureTracker::new(ScreenGeometry::default(), ReplayPolicy::default());
                let now = Instant::now();
                let mut effects = 0usize;
                for piece in bytes.chunks(chunk) {
                    for line in framer.push(piece) {
                        if tracker.apply(classify(&line, LineDialect::Strict), now).is_some() {
                            effects += 1;
                        }
                    }
                }
                black_box(effects)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_pipeline);
criterion_main!(benches);
