//! Integration tests for multitap-config.
//!
//! File round trips for the engine config and persisted state, and the
//! conversion into the DSP crate's types.

use multitap_config::{
    ConfigError, EngineConfig, KNOB_COUNT, META_COLUMN, PersistedState, ValidationError,
    knob_index,
};
use multitap_effects::{HoleControl, Mode, ReverbKind, ReverbParams, Tap};
use tempfile::TempDir;

/// Save then load an engine config through nested directories.
#[test]
fn test_engine_config_file_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("nested").join("engine.toml");

    let mut config = EngineConfig {
        max_feedback: 0.9,
        meta_delay_limit: 1.5,
        max_delay_seconds: 2.0,
        max_sample_rate: 96_000,
        num_taps: 2,
        ..EngineConfig::default()
    };
    config.hole.delay_time = 0.35;

    config.save(&path).expect("should save config");
    assert!(path.exists());

    let loaded = EngineConfig::load(&path).expect("should load config");
    assert_eq!(loaded, config);
    assert_eq!(loaded.limits().max_sample_rate, 96_000.0);
    assert_eq!(loaded.hole_tuning().delay_time, 0.35);
}

/// A config file with out-of-range values is rejected as a whole.
#[test]
fn test_invalid_config_file_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("engine.toml");
    std::fs::write(
        &path,
        "max_feedback = 2.0\nnum_taps = 0\n\n[hole]\nmod_freq = 40.0\n",
    )
    .expect("should write file");

    match EngineConfig::load(&path) {
        Err(ConfigError::Validation(ValidationError::Multiple(errors))) => {
            assert_eq!(errors.len(), 3, "{errors:?}");
            let (_, max) = HoleControl::ModFreq.range();
            assert!(errors.contains(&ValidationError::OutOfRange {
                field: "hole.mod_freq".to_string(),
                value: 40.0,
                min: 0.0,
                max,
            }));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_read_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let err = EngineConfig::load(temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));

    let err = PersistedState::load(temp_dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

/// Persisted state survives a file round trip unchanged.
#[test]
fn test_state_file_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("state").join("state.json");

    let mut state = PersistedState::default();
    state.knobs[knob_index(1, Mode::Fx2, 0)] = 0.6;
    state.knobs[knob_index(META_COLUMN, Mode::Delay, 1)] = 0.9;
    state.selected_modes = [4, 3, 2, 1, 0];
    state.input_gain = 0.5;
    state.phaser_noise_gain = 0.25;
    state.reverb_mode = ReverbKind::Fdn.index();

    state.save(&path).expect("should save state");
    let loaded = PersistedState::load(&path).expect("should load state");
    assert_eq!(loaded, state);
    assert_eq!(loaded.reverb_kind(), ReverbKind::Fdn);
}

/// A legacy document holding only the flat `state` array loads with
/// defaults for everything else.
#[test]
fn test_legacy_state_document() {
    let table: Vec<String> = (0..KNOB_COUNT).map(|i| format!("{}", i as f32 / 100.0)).collect();
    let json = format!("{{ \"state\": [{}] }}", table.join(", "));

    let state = PersistedState::from_json(&json).expect("should parse legacy state");
    assert_eq!(state.knobs.len(), KNOB_COUNT);
    assert_eq!(state.knob(2, Mode::Filter, 1), 0.25);
    assert_eq!(state.selected_modes, [0; 5]);
    assert_eq!(ReverbParams::from(state.reverb), ReverbParams::default());
    assert_eq!(state.phaser_noise_gain, 0.0);
}

/// Hostile values are sanitized, never rejected.
#[test]
fn test_hostile_state_is_sanitized() {
    let json = r#"{
        "knobs": [5.0, -3.0],
        "selected_modes": [99, 1, 2, 3, 4],
        "input_gain": -1.0,
        "reverb": { "mix": 4.0, "time": -2.0 },
        "reverb_mode": 12
    }"#;
    let state = PersistedState::from_json(json).expect("should parse");
    assert_eq!(state.knobs[0], 1.0);
    assert_eq!(state.knobs[1], 0.0);
    assert_eq!(state.selected_mode(0), Mode::Delay);
    assert_eq!(state.input_gain, 0.0);
    assert_eq!(state.reverb.mix, 1.0);
    assert_eq!(state.reverb.time, 0.0);
    assert_eq!(state.reverb_kind(), ReverbKind::Diffusion);
    assert!(state.knobs.iter().all(|k| (0.0..=1.0).contains(k)));
}

/// Limits from a loaded config drive a working tap.
#[test]
fn test_config_limits_build_a_tap() {
    let config = EngineConfig::from_toml("max_delay_seconds = 0.1\nmeta_delay_limit = 0.05\n")
        .expect("should parse config");
    let mut tap = Tap::new(config.limits());
    tap.set_params(Mode::Delay, 1.0, 0.5, 0.0);
    assert!(tap.delay().delay_seconds() <= 0.1);

    for i in 0..10_000 {
        let x = if i == 0 { 1.0 } else { 0.0 };
        let (l, r) = tap.process(x, x, 48000.0);
        assert!(l.is_finite() && r.is_finite());
    }
}
