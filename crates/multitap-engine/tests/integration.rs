//! Integration tests for multitap-engine.
//!
//! Whole-engine behaviour: tails dying out under every reverb, stability
//! under the harshest settings, state documents and the cross-thread
//! parameter store.

use std::sync::Once;
use std::thread;

use multitap_config::{EngineConfig, META_COLUMN, PersistedState};
use multitap_effects::{Mode, ReverbKind, ReverbParams};
use multitap_engine::{MultitapEngine, SharedParams};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Routes engine logs to the test harness.
fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn short_config() -> EngineConfig {
    EngineConfig {
        max_delay_seconds: 1.0,
        meta_delay_limit: 0.5,
        max_sample_rate: 48_000,
        ..EngineConfig::default()
    }
}

/// Deterministic noise in [-1, 1].
fn noise(seed: &mut u32) -> f32 {
    *seed ^= *seed << 13;
    *seed ^= *seed >> 17;
    *seed ^= *seed << 5;
    (*seed as f32 / u32::MAX as f32) * 2.0 - 1.0
}

/// After a burst, silence drives every reverb's output to (near) zero.
#[test]
fn test_silence_drains_every_reverb() {
    init_tracing();
    const SR: f32 = 16000.0;

    for kind in ReverbKind::ALL {
        let mut engine = MultitapEngine::new(short_config());
        engine.set_reverb_kind(kind);
        engine.set_reverb_params(&ReverbParams {
            mix: 1.0,
            ..ReverbParams::default()
        });
        for i in 0..4 {
            engine.set_knobs(i, Mode::Delay, 0.01 * i as f32, 0.3);
        }

        let mut seed = 0x1234_5678;
        let burst = (0.25 * SR) as usize;
        for _ in 0..burst {
            let x = 0.5 * noise(&mut seed);
            engine.process(x, None, SR);
        }

        let drain = (12.0 * SR) as usize;
        let mut tail = 0.0f32;
        for n in 0..drain {
            let (l, r) = engine.process(0.0, None, SR);
            if n >= drain - (0.5 * SR) as usize {
                tail = tail.max(l.abs()).max(r.abs());
            }
        }
        assert!(tail < 1e-4, "{}: tail {tail}", kind.name());
    }
}

/// Every knob and macro at its extreme, full feedback on every tap.
#[test]
fn test_harshest_settings_stay_finite() {
    init_tracing();
    for kind in ReverbKind::ALL {
        let mut engine = MultitapEngine::new(short_config());
        for column in 0..=META_COLUMN {
            for mode in Mode::ALL {
                engine.set_knobs(column, mode, 1.0, 1.0);
            }
        }
        for i in 0..4 {
            engine.set_knobs(i, Mode::Delay, 0.0, 1.0);
        }
        engine.set_knobs(META_COLUMN, Mode::Delay, 0.0, 1.0);
        engine.set_input_gain(1.0);
        engine.set_phaser_noise_gain(1.0);
        engine.set_reverb_kind(kind);
        engine.set_reverb_params(&ReverbParams {
            mix: 1.0,
            gravity: 1.0,
            diffusion: 1.0,
            damping: 0.0,
            mod_freq: 1.0,
            mod_depth: 1.0,
            time: 1.0,
        });

        let mut seed = 0xdead_beef;
        for n in 0..48_000 {
            let x = 4.0 * noise(&mut seed);
            let (l, r) = engine.process(x, Some(-x), 48000.0);
            assert!(
                l.is_finite() && r.is_finite(),
                "{}: non-finite output at sample {n}",
                kind.name()
            );
        }
    }
}

/// Switching sample rate mid-stream keeps the output finite.
#[test]
fn test_sample_rate_changes() {
    init_tracing();
    let mut engine = MultitapEngine::new(short_config());
    engine.set_reverb_kind(ReverbKind::Hole);
    engine.set_knobs(0, Mode::Fx1, 0.5, 1.0);
    for &sr in &[48000.0, 8000.0, 96000.0, 44100.0] {
        for n in 0..4000 {
            let x = (n as f32 * 0.05).sin();
            let (l, r) = engine.process(x, None, sr);
            assert!(l.is_finite() && r.is_finite(), "{sr} Hz, sample {n}");
        }
    }
}

/// A state document survives a JSON round trip into a fresh engine.
#[test]
fn test_state_json_round_trip() {
    init_tracing();
    let mut engine = MultitapEngine::new(short_config());
    engine.set_knobs(3, Mode::Fx2, 0.4, 0.6);
    engine.set_knobs(META_COLUMN, Mode::AmpPan, 0.3, 0.7);
    engine.select_mode(META_COLUMN, Mode::AmpPan);
    engine.set_reverb_kind(ReverbKind::Hole);
    engine.set_phaser_noise_gain(0.5);

    let json = engine.snapshot().to_json().expect("should serialize");
    let state = PersistedState::from_json(&json).expect("should parse");

    let mut restored = MultitapEngine::new(short_config());
    restored.restore(&state);
    assert_eq!(restored.snapshot(), engine.snapshot());
    assert_eq!(restored.selected_mode(META_COLUMN), Mode::AmpPan);

    // Same state, same audio.
    engine.reset();
    restored.reset();
    for n in 0..5000 {
        let x = if n % 700 == 0 { 1.0 } else { 0.0 };
        assert_eq!(engine.process(x, None, 48000.0), restored.process(x, None, 48000.0));
    }
}

/// Blocks and single samples give identical results.
#[test]
fn test_block_matches_sample_loop() {
    let mut by_sample = MultitapEngine::new(short_config());
    let mut by_block = MultitapEngine::new(short_config());
    for engine in [&mut by_sample, &mut by_block] {
        engine.set_knobs(0, Mode::Delay, 0.001, 0.5);
        engine.set_knobs(2, Mode::Fx1, 0.3, 0.8);
    }

    let left: Vec<f32> = (0..1024).map(|n| (n as f32 * 0.03).sin()).collect();
    let right: Vec<f32> = (0..1024).map(|n| (n as f32 * 0.07).cos()).collect();
    let mut out_l = vec![0.0; 1024];
    let mut out_r = vec![0.0; 1024];
    by_block.process_block(&left, Some(&right), &mut out_l, &mut out_r, 48000.0);

    for n in 0..1024 {
        let (l, r) = by_sample.process(left[n], Some(right[n]), 48000.0);
        assert_eq!((l, r), (out_l[n], out_r[n]), "sample {n}");
    }
}

/// A control thread writes while the audio thread processes blocks.
#[test]
fn test_shared_params_across_threads() {
    init_tracing();
    let shared = SharedParams::default();
    let control = shared.clone();

    let writer = thread::spawn(move || {
        for step in 0..200 {
            let k = step as f32 / 200.0;
            control.set_knob(step % 4, Mode::Delay, 0, k * 0.1);
            control.set_knob(META_COLUMN, Mode::Filter, 1, k);
            if step == 150 {
                control.set_reverb_kind(ReverbKind::Fdn);
            }
            thread::yield_now();
        }
        control.set_input_gain(0.8);
    });

    let mut engine = MultitapEngine::new(short_config());
    let input = vec![0.1f32; 64];
    let mut out_l = vec![0.0; 64];
    let mut out_r = vec![0.0; 64];
    for _ in 0..400 {
        engine.apply_shared(&shared);
        engine.process_block(&input, None, &mut out_l, &mut out_r, 48000.0);
        assert!(out_l.iter().chain(&out_r).all(|s| s.is_finite()));
    }
    writer.join().expect("control thread panicked");

    engine.apply_shared(&shared);
    assert_eq!(engine.snapshot(), shared.to_state());
    assert_eq!(engine.reverb_kind(), ReverbKind::Fdn);
    assert_eq!(engine.input_gain(), 0.8);
}
