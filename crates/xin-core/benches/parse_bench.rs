//! Criterion benchmarks for the line grammar and pointer accumulation.
//!
//! Motion lines arrive at pointer-polling rate, so parsing plus clamping must
//! stay far below a millisecond per line.
//!
//! Run with:
//! ```bash
//! cargo bench --package xin-core --bench parse_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use xin_core::protocol::parse_line;
use xin_core::{PointerPosition, PointerState, ScreenBounds};

// ── Line fixtures ─────────────────────────────────────────────────────────────

const LINES: &[(&str, &str)] = &[
    ("KeyDerived", "k 65"),
    ("KeyExplicit", "K 65 38"),
    ("Button", "b 0 1"),
    ("Motion", "m -12 7"),
    ("Layout", "l us"),
    ("UnknownControl", "x 1 2"),
    ("Invalid", "garbage"),
];

// ── Benchmark groups ──────────────────────────────────────────────────────────

/// Benchmarks `parse_line` for every grammar alternative, including the error paths.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_line");
    for (name, line) in LINES {
        group.bench_with_input(BenchmarkId::new("line", name), line, |b, line| {
            b.iter(|| parse_line(black_box(line)))
        });
    }
    group.finish();
}

/// Benchmarks the motion hot path: parse a motion line and advance the pointer.
fn bench_motion_hot_path(c: &mut Criterion) {
    let bounds = ScreenBounds::new(1920, 1080);
    let mut state = PointerState::new();
    state.seed(PointerPosition::new(960, 540));

    c.bench_function("motion_parse_and_advance", |b| {
        b.iter(|| {
            if let Ok(xin_core::Command::Motion(m)) = parse_line(black_box("m 3 -2")) {
                state.advance(m.dx, m.dy, bounds);
            }
        })
    });
}

criterion_group!(benches, bench_parse, bench_motion_hot_path);
criterion_main!(benches);
