//! Разбор кадров и проход анализа по сгенерированному файлу.
//!
//! Запуск: cargo bench -p sweepstat-benchmark

use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sweepstat_analyzer::{AnalysisConfig, OccupancyEngine};
use sweepstat_core::{CaptureFile, FrameDecoder, DEFAULT_HEADER_LINE_LIMIT};

/// Файл FSVR в памяти: `frames` кадров по `values` выборок со случайными уровнями.
fn synthetic_capture(
    values: usize,
    frames: usize,
) -> String {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut raw = format!(
        "Type;FSVR-7;\nSWT;0.005;s\nx-Unit;Hz;\ny-Unit;dBm;\nValues;{values};\nFrames;{frames};\n"
    );

    for i in 0..frames {
        raw.push_str(&format!(
            "Frame;{};\nTimestamp;12.Apr 17;{:02}:{:02}:{:02}.{:03};\n",
            i + 1,
            (i / 3600) % 24,
            (i / 60) % 60,
            i % 60,
            rng.gen_range(0..1000)
        ));
        for v in 0..values {
            let freq = 2_432_000_000.0 + v as f64 * 4_000.0;
            let level: f64 = rng.gen_range(-100.0..-40.0);
            raw.push_str(&format!("{freq};{level:.2};\n"));
        }
    }

    raw
}

fn open_capture(raw: &str) -> CaptureFile<Cursor<Vec<u8>>> {
    let mut capture = CaptureFile::new(Cursor::new(raw.as_bytes().to_vec()), "bench");
    if let Err(e) = capture.read_header(DEFAULT_HEADER_LINE_LIMIT) {
        panic!("synthetic header rejected: {e}");
    }
    capture
}

// ============================================================================
// Разбор одного кадра
// ============================================================================

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for values in [101usize, 501, 1001] {
        let raw = synthetic_capture(values, 1);
        let capture = open_capture(&raw);
        let header = capture.header().cloned().unwrap_or_else(|e| panic!("{e}"));
        let lines: Vec<&str> = raw.lines().skip(6).collect();

        group.throughput(Throughput::Elements(values as u64));
        group.bench_with_input(BenchmarkId::new("decode", values), &lines, |b, lines| {
            b.iter(|| FrameDecoder::decode(&header, black_box(lines.as_slice())))
        });
    }

    group.finish();
}

// ============================================================================
// Полный проход анализа
// ============================================================================

fn bench_engine_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_pass");
    let raw = synthetic_capture(501, 200);

    let config = AnalysisConfig {
        frame_count: 200,
        thresholds: vec![-80.0, -70.0, -60.0],
        ..AnalysisConfig::default()
    };

    let mut engine = OccupancyEngine::new(open_capture(&raw), &config)
        .unwrap_or_else(|e| panic!("{e}"));

    group.throughput(Throughput::Elements(200));

    group.bench_function("average_per_frame", |b| {
        b.iter(|| black_box(engine.average_per_frame()))
    });

    group.bench_function("transition_matrix", |b| {
        b.iter(|| black_box(engine.transition_matrix()))
    });

    group.bench_function("max_per_frame", |b| {
        b.iter(|| black_box(engine.max_per_frame()))
    });

    group.finish();
}

criterion_group!(benches, bench_frame_decode, bench_engine_pass);
criterion_main!(benches);
