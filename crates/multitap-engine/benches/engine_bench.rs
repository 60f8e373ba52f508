//! Criterion benchmarks for the complete multitap engine
//!
//! Run with: cargo bench -p multitap-engine
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use multitap_config::{EngineConfig, META_COLUMN};
use multitap_effects::{Mode, ReverbKind};
use multitap_engine::{MultitapEngine, SharedParams};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn busy_engine(kind: ReverbKind) -> MultitapEngine {
    let mut engine = MultitapEngine::new(EngineConfig {
        max_delay_seconds: 2.0,
        meta_delay_limit: 1.0,
        max_sample_rate: 48_000,
        ..EngineConfig::default()
    });
    for i in 0..4 {
        engine.set_knobs(i, Mode::Delay, 0.02 * (i + 1) as f32, 0.5);
        engine.set_knobs(i, Mode::Fx1, 0.3, 0.8);
        engine.set_knobs(i, Mode::Fx2, 0.4, 0.6);
    }
    engine.set_knobs(META_COLUMN, Mode::Filter, 0.6, 0.4);
    engine.set_reverb_kind(kind);
    engine
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("MultitapEngine");

    for kind in ReverbKind::ALL {
        for &block_size in BLOCK_SIZES {
            let input = generate_test_signal(block_size);
            let mut out_l = vec![0.0; block_size];
            let mut out_r = vec![0.0; block_size];
            group.bench_with_input(BenchmarkId::new(kind.name(), block_size), &block_size, |b, _| {
                let mut engine = busy_engine(kind);
                b.iter(|| {
                    engine.process_block(black_box(&input), None, &mut out_l, &mut out_r, SAMPLE_RATE);
                    black_box((&out_l, &out_r));
                })
            });
        }
    }

    group.finish();
}

fn bench_apply_shared(c: &mut Criterion) {
    let mut engine = busy_engine(ReverbKind::Diffusion);
    let shared = SharedParams::default();

    c.bench_function("apply_shared/unchanged", |b| {
        engine.apply_shared(&shared);
        b.iter(|| black_box(engine.apply_shared(black_box(&shared))))
    });

    c.bench_function("apply_shared/one_knob", |b| {
        let mut k = 0.0f32;
        b.iter(|| {
            k = (k + 0.01) % 1.0;
            shared.set_knob(1, Mode::Delay, 0, k);
            black_box(engine.apply_shared(&shared))
        })
    });
}

criterion_group!(benches, bench_engine, bench_apply_shared);
criterion_main!(benches);
