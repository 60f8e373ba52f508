//! Four independent delay taps, a meta column and a reverb bank.
//!
//! ```text
//!            ┌─► tap 0 ─┐
//!            ├─► tap 1 ─┤
//! in ─► gain ┼─► tap 2 ─┼─► Σ / num_taps ─► reverb ─► out
//!            └─► tap 3 ─┘
//!                 ▲
//!          meta offsets (2k − 1) per mode
//! ```
//!
//! Each column stores a knob pair for every mode, so switching the mode a
//! host's two physical knobs address never loses the values of the other
//! modes. Tap columns feed their pairs to the tap's processors; the meta
//! column turns its pairs into bipolar offsets applied to every tap.

use multitap_config::validation::MAX_TAPS;
use multitap_config::{
    COLUMNS, DEFAULT_INPUT_GAIN, EngineConfig, KNOBS_PER_MODE, META_COLUMN, PersistedState,
    default_knob,
};
use multitap_core::{SmoothedParam, db_to_linear, gain};
use multitap_effects::{Mode, ReverbBank, ReverbKind, ReverbParams, Tap};

use crate::params::SharedParams;

/// Input gain smoothing time.
const INPUT_GAIN_SMOOTHING_MS: f32 = 15.0;

type KnobTable = [[[f32; KNOBS_PER_MODE]; Mode::COUNT]; COLUMNS];

/// Clamps into [0, 1]; non-finite values take `fallback`.
fn unit(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// The complete multitap delay.
///
/// Every buffer is allocated in [`new`](Self::new); nothing on the
/// processing path allocates.
///
/// # Example
///
/// ```rust
/// use multitap_engine::MultitapEngine;
/// use multitap_config::EngineConfig;
/// use multitap_effects::Mode;
///
/// let mut engine = MultitapEngine::new(EngineConfig {
///     max_delay_seconds: 1.0,
///     meta_delay_limit: 0.5,
///     ..EngineConfig::default()
/// });
/// engine.set_knobs(0, Mode::Delay, 0.01, 0.4);
///
/// let (l, r) = engine.process(0.5, None, 48000.0);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct MultitapEngine {
    config: EngineConfig,
    taps: Vec<Tap>,
    tap_outputs: Vec<(f32, f32)>,
    knobs: KnobTable,
    selected: [Mode; COLUMNS],
    input_gain_knob: f32,
    input_gain: SmoothedParam,
    phaser_noise_gain: f32,
    reverb: ReverbBank,
    sample_rate: f32,
    applied_generation: u64,
}

impl Default for MultitapEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl MultitapEngine {
    /// Builds the engine and allocates every delay buffer.
    ///
    /// The tap count is clamped to 1..=4; the rest of the config is used as
    /// given (run [`EngineConfig::validate`] first for user-supplied files).
    pub fn new(config: EngineConfig) -> Self {
        let num_taps = config.num_taps.clamp(1, MAX_TAPS);
        let limits = config.limits();
        let taps = (0..num_taps).map(|_| Tap::new(limits)).collect();
        let reverb = ReverbBank::new(config.max_sample_rate as f32, config.hole_tuning());

        tracing::info!(
            num_taps,
            max_delay_seconds = config.max_delay_seconds,
            max_sample_rate = config.max_sample_rate,
            "multitap engine ready"
        );

        let mut engine = Self {
            config,
            taps,
            tap_outputs: vec![(0.0, 0.0); num_taps],
            knobs: [[[0.0; KNOBS_PER_MODE]; Mode::COUNT]; COLUMNS],
            selected: [Mode::Delay; COLUMNS],
            input_gain_knob: DEFAULT_INPUT_GAIN,
            input_gain: SmoothedParam::with_config(1.0, 48000.0, INPUT_GAIN_SMOOTHING_MS),
            phaser_noise_gain: 0.0,
            reverb,
            sample_rate: 0.0,
            applied_generation: 0,
        };
        engine.apply_state(&PersistedState::default());
        engine
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of active taps.
    pub fn num_taps(&self) -> usize {
        self.taps.len()
    }

    /// One tap, for inspection.
    pub fn tap(&self, index: usize) -> Option<&Tap> {
        self.taps.get(index)
    }

    /// Output of a tap from the most recent sample.
    pub fn tap_output(&self, index: usize) -> Option<(f32, f32)> {
        self.tap_outputs.get(index).copied()
    }

    /// Stores a column's knob pair for one mode and applies it.
    ///
    /// Values are clamped to [0, 1]; non-finite values take the mode's
    /// default. Columns past the last tap (other than the meta column) only
    /// store.
    pub fn set_knobs(&mut self, column: usize, mode: Mode, k1: f32, k2: f32) {
        if column >= COLUMNS {
            return;
        }
        self.knobs[column][mode.index()] = [
            unit(k1, default_knob(column, mode, 0)),
            unit(k2, default_knob(column, mode, 1)),
        ];
        self.push_knobs(column, mode);
    }

    /// Stored knob pair of a column for one mode.
    pub fn knobs(&self, column: usize, mode: Mode) -> [f32; KNOBS_PER_MODE] {
        self.knobs.get(column).map_or_else(
            || [default_knob(column, mode, 0), default_knob(column, mode, 1)],
            |c| c[mode.index()],
        )
    }

    /// Points a column's knobs at another mode and returns the pair stored
    /// for it, so the host can re-seat its controls.
    pub fn select_mode(&mut self, column: usize, mode: Mode) -> [f32; KNOBS_PER_MODE] {
        if let Some(slot) = self.selected.get_mut(column) {
            *slot = mode;
        }
        self.knobs(column, mode)
    }

    /// Mode a column currently addresses.
    pub fn selected_mode(&self, column: usize) -> Mode {
        self.selected.get(column).copied().unwrap_or_default()
    }

    /// Input gain knob: `78·k − 72` dB, smoothed.
    pub fn set_input_gain(&mut self, knob: f32) {
        self.input_gain_knob = unit(knob, DEFAULT_INPUT_GAIN);
        self.input_gain
            .set_target(db_to_linear(gain::knob_to_db(self.input_gain_knob)));
    }

    /// Input gain knob.
    pub fn input_gain(&self) -> f32 {
        self.input_gain_knob
    }

    /// Reverb targets; every engine in the bank slews toward them.
    pub fn set_reverb_params(&mut self, params: &ReverbParams) {
        self.reverb.set_params(params);
    }

    /// Clamped reverb targets.
    pub fn reverb_params(&self) -> ReverbParams {
        self.reverb.params()
    }

    /// Selects the reverb engine heard at the output.
    pub fn set_reverb_kind(&mut self, kind: ReverbKind) {
        let previous = self.reverb.kind();
        if previous != kind {
            tracing::debug!(from = previous.name(), to = kind.name(), "reverb engine switched");
            self.reverb.set_kind(kind);
        }
    }

    /// Active reverb engine.
    pub fn reverb_kind(&self) -> ReverbKind {
        self.reverb.kind()
    }

    /// Pink noise injected into every tap's phaser.
    pub fn set_phaser_noise_gain(&mut self, gain: f32) {
        self.phaser_noise_gain = unit(gain, 0.0);
        for column in 0..self.taps.len() {
            self.push_knobs(column, Mode::Fx2);
        }
    }

    /// Phaser noise macro.
    pub fn phaser_noise_gain(&self) -> f32 {
        self.phaser_noise_gain
    }

    fn push_knobs(&mut self, column: usize, mode: Mode) {
        let [k1, k2] = self.knobs[column][mode.index()];
        if column == META_COLUMN {
            let (o1, o2) = (gain::knob_to_bipolar(k1), gain::knob_to_bipolar(k2));
            for tap in &mut self.taps {
                tap.set_offsets(mode, o1, o2);
            }
        } else if let Some(tap) = self.taps.get_mut(column) {
            let p3 = if mode == Mode::Fx2 { self.phaser_noise_gain } else { 0.0 };
            tap.set_params(mode, k1, k2, p3);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        tracing::debug!(from = self.sample_rate, to = sample_rate, "sample rate changed");
        if sample_rate > self.config.max_sample_rate as f32 {
            tracing::warn!(
                sample_rate,
                max_sample_rate = self.config.max_sample_rate,
                "sample rate above configured maximum; longest delays will be clamped"
            );
        }
        self.sample_rate = sample_rate;
        self.input_gain.set_sample_rate(sample_rate);
    }

    /// Processes one stereo sample.
    ///
    /// An absent right input is normalled to the left. A sample rate below
    /// 1 Hz passes the input through untouched.
    #[inline]
    pub fn process(&mut self, left: f32, right: Option<f32>, sample_rate: f32) -> (f32, f32) {
        let right = right.unwrap_or(left);
        if sample_rate.is_nan() || sample_rate < 1.0 {
            self.tap_outputs.fill((left, right));
            return (left, right);
        }
        if (sample_rate - self.sample_rate).abs() > 1.0 {
            self.set_sample_rate(sample_rate);
        }

        let g = self.input_gain.advance();
        let (in_l, in_r) = (left * g, right * g);

        let (mut sum_l, mut sum_r) = (0.0, 0.0);
        for (tap, out) in self.taps.iter_mut().zip(self.tap_outputs.iter_mut()) {
            *out = tap.process(in_l, in_r, sample_rate);
            sum_l += out.0;
            sum_r += out.1;
        }

        let scale = 1.0 / self.taps.len() as f32;
        let (mut l, mut r) = (sum_l * scale, sum_r * scale);
        self.reverb.process(&mut l, &mut r, sample_rate);
        (l, r)
    }

    /// Processes a block. `right: None` normals every frame to the left
    /// input. Handles `min` of all slice lengths.
    pub fn process_block(
        &mut self,
        left: &[f32],
        right: Option<&[f32]>,
        out_left: &mut [f32],
        out_right: &mut [f32],
        sample_rate: f32,
    ) {
        let mut len = left.len().min(out_left.len()).min(out_right.len());
        if let Some(right) = right {
            len = len.min(right.len());
        }
        for i in 0..len {
            let r = right.map(|r| r[i]);
            let (l, r) = self.process(left[i], r, sample_rate);
            out_left[i] = l;
            out_right[i] = r;
        }
    }

    /// Clears every delay line and reverb tail.
    pub fn reset(&mut self) {
        for tap in &mut self.taps {
            tap.reset();
        }
        self.tap_outputs.fill((0.0, 0.0));
        self.reverb.reset();
        self.input_gain.snap_to_target();
    }

    /// Current host state.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            knobs: self.knobs.iter().flatten().flatten().copied().collect(),
            selected_modes: self.selected.map(Mode::index),
            input_gain: self.input_gain_knob,
            reverb: self.reverb.params().into(),
            phaser_noise_gain: self.phaser_noise_gain,
            reverb_mode: self.reverb.kind().index(),
        }
    }

    /// Restores host state. Out-of-range values are sanitized first.
    pub fn restore(&mut self, state: &PersistedState) {
        let mut state = state.clone();
        state.sanitize();
        tracing::debug!(reverb = state.reverb_kind().name(), "restoring state");
        self.apply_state(&state);
    }

    fn apply_state(&mut self, state: &PersistedState) {
        self.phaser_noise_gain = unit(state.phaser_noise_gain, 0.0);
        for column in 0..COLUMNS {
            for mode in Mode::ALL {
                self.set_knobs(
                    column,
                    mode,
                    state.knob(column, mode, 0),
                    state.knob(column, mode, 1),
                );
            }
            self.selected[column] = state.selected_mode(column);
        }
        self.set_input_gain(state.input_gain);
        self.input_gain.snap_to_target();
        self.set_reverb_params(&state.reverb.into());
        self.set_reverb_kind(state.reverb_kind());
    }

    /// Pulls changes from a [`SharedParams`] store. Cheap when nothing
    /// changed; call once per block from the audio thread. Returns `true`
    /// when anything was applied.
    pub fn apply_shared(&mut self, shared: &SharedParams) -> bool {
        let generation = shared.generation();
        if generation == self.applied_generation {
            return false;
        }
        self.applied_generation = generation;

        let noise = unit(shared.phaser_noise_gain(), 0.0);
        if noise != self.phaser_noise_gain {
            self.set_phaser_noise_gain(noise);
        }

        for column in 0..COLUMNS {
            for mode in Mode::ALL {
                let pair = [
                    unit(shared.knob(column, mode, 0), default_knob(column, mode, 0)),
                    unit(shared.knob(column, mode, 1), default_knob(column, mode, 1)),
                ];
                if pair != self.knobs[column][mode.index()] {
                    self.set_knobs(column, mode, pair[0], pair[1]);
                }
            }
            self.selected[column] = shared.selected_mode(column);
        }

        let input_gain = unit(shared.input_gain(), DEFAULT_INPUT_GAIN);
        if input_gain != self.input_gain_knob {
            self.set_input_gain(input_gain);
        }

        let params = shared.reverb_params().clamped();
        if params != self.reverb.params() {
            self.set_reverb_params(&params);
        }
        self.set_reverb_kind(shared.reverb_kind());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn small_config() -> EngineConfig {
        EngineConfig {
            max_delay_seconds: 1.0,
            meta_delay_limit: 0.5,
            max_sample_rate: 48_000,
            ..EngineConfig::default()
        }
    }

    /// Runs silence until the slewed reverb controls settle.
    fn settle(engine: &mut MultitapEngine) {
        for _ in 0..40_000 {
            engine.process(0.0, None, SR);
        }
    }

    #[test]
    fn test_default_taps_sit_at_half_a_second() {
        let mut engine = MultitapEngine::new(EngineConfig {
            max_sample_rate: 48_000,
            ..EngineConfig::default()
        });
        assert_eq!(engine.num_taps(), 4);
        for i in 0..4 {
            let t = engine.tap(i).unwrap().delay().delay_seconds();
            assert!((t - 0.5).abs() < 1e-4, "tap {i}: {t}");
        }

        let mut early = 0.0f32;
        let mut late = 0.0f32;
        for n in 0..26_000 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            engine.process(x, None, SR);
            let (l, _) = engine.tap_output(0).unwrap();
            if n < 23_990 {
                early = early.max(l.abs());
            } else {
                late = late.max(l.abs());
            }
        }
        assert_eq!(early, 0.0);
        assert!(late > 1e-3, "late {late}");
    }

    #[test]
    fn test_meta_column_offsets_every_tap() {
        let mut engine = MultitapEngine::new(small_config());
        for i in 0..4 {
            engine.set_knobs(i, Mode::Delay, 0.0, 0.0);
        }
        // +1 offset adds the full meta range.
        engine.set_knobs(META_COLUMN, Mode::Delay, 1.0, 0.5);
        for i in 0..4 {
            let t = engine.tap(i).unwrap().delay().delay_seconds();
            assert!((t - 0.501).abs() < 1e-5, "tap {i}: {t}");
        }

        engine.set_knobs(META_COLUMN, Mode::AmpPan, 0.0, 0.5);
        for i in 0..4 {
            let db = engine.tap(i).unwrap().amp_pan().total_db();
            assert!((db - (-48.0)).abs() < 1e-3, "tap {i}: {db}");
        }
    }

    #[test]
    fn test_knobs_are_stored_per_mode() {
        let mut engine = MultitapEngine::new(small_config());
        engine.set_knobs(2, Mode::Filter, 0.2, 0.8);
        engine.set_knobs(2, Mode::Fx1, 0.6, 0.9);

        assert_eq!(engine.select_mode(2, Mode::Filter), [0.2, 0.8]);
        assert_eq!(engine.selected_mode(2), Mode::Filter);
        assert_eq!(engine.select_mode(2, Mode::Fx1), [0.6, 0.9]);
        assert_eq!(engine.knobs(2, Mode::Filter), [0.2, 0.8]);
    }

    #[test]
    fn test_hostile_knobs_are_clamped() {
        let mut engine = MultitapEngine::new(small_config());
        engine.set_knobs(1, Mode::AmpPan, f32::NAN, 7.0);
        assert_eq!(engine.knobs(1, Mode::AmpPan), [DEFAULT_INPUT_GAIN, 1.0]);
        engine.set_knobs(99, Mode::AmpPan, 0.1, 0.1);
        assert_eq!(engine.knobs(99, Mode::AmpPan), [DEFAULT_INPUT_GAIN, 0.5]);
    }

    #[test]
    fn test_right_input_is_normalled_to_left() {
        let mut mono = MultitapEngine::new(small_config());
        let mut stereo = MultitapEngine::new(small_config());
        for engine in [&mut mono, &mut stereo] {
            engine.set_knobs(0, Mode::Delay, 0.0, 0.5);
            engine.set_knobs(1, Mode::AmpPan, 0.9, 0.1);
        }
        for n in 0..2000 {
            let x = (n as f32 * 0.01).sin();
            assert_eq!(mono.process(x, None, SR), stereo.process(x, Some(x), SR));
        }
    }

    #[test]
    fn test_sum_is_averaged_over_taps() {
        let mut engine = MultitapEngine::new(EngineConfig {
            num_taps: 2,
            ..small_config()
        });
        engine.set_reverb_params(&ReverbParams {
            mix: 0.0,
            ..ReverbParams::default()
        });
        for i in 0..2 {
            engine.set_knobs(i, Mode::Delay, 0.0, 0.0);
        }
        engine.set_knobs(1, Mode::AmpPan, 0.5, 0.5);
        settle(&mut engine);

        for n in 0..500 {
            let x = if n % 50 == 0 { 1.0 } else { 0.0 };
            let (l, r) = engine.process(x, None, SR);
            let (a, b) = (engine.tap_output(0).unwrap(), engine.tap_output(1).unwrap());
            assert!((l - 0.5 * (a.0 + b.0)).abs() < 1e-5, "sample {n}");
            assert!((r - 0.5 * (a.1 + b.1)).abs() < 1e-5, "sample {n}");
        }
        assert_eq!(engine.tap_output(2), None);
    }

    #[test]
    fn test_input_gain_scales_taps() {
        let mut engine = MultitapEngine::new(small_config());
        engine.set_knobs(0, Mode::Delay, 0.0, 0.0);
        engine.set_input_gain(0.0);
        engine.reset();

        let mut peak = 0.0f32;
        for n in 0..1000 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            engine.process(x, None, SR);
            peak = peak.max(engine.tap_output(0).unwrap().0.abs());
        }
        // −72 dB input into a 0 dB centred tap.
        assert!(peak < 10f32.powf(-72.0 / 20.0) * 1.5, "peak {peak}");
        assert!(peak > 0.0);
    }

    #[test]
    fn test_phaser_noise_reaches_every_tap() {
        let mut engine = MultitapEngine::new(small_config());
        engine.set_phaser_noise_gain(0.4);
        for i in 0..4 {
            assert_eq!(engine.tap(i).unwrap().phaser().target_noise_gain(), 0.4);
        }
        // Later knob moves keep the macro.
        engine.set_knobs(3, Mode::Fx2, 0.2, 0.7);
        assert_eq!(engine.tap(3).unwrap().phaser().target_noise_gain(), 0.4);
    }

    #[test]
    fn test_reverb_switch_and_params() {
        let mut engine = MultitapEngine::new(small_config());
        assert_eq!(engine.reverb_kind(), ReverbKind::Diffusion);
        engine.set_reverb_kind(ReverbKind::Hole);
        engine.set_reverb_params(&ReverbParams {
            mix: 3.0,
            ..ReverbParams::default()
        });
        assert_eq!(engine.reverb_kind(), ReverbKind::Hole);
        assert_eq!(engine.reverb_params().mix, 1.0);
    }

    #[test]
    fn test_invalid_sample_rate_passes_through() {
        let mut engine = MultitapEngine::new(small_config());
        assert_eq!(engine.process(0.3, Some(-0.2), 0.0), (0.3, -0.2));
        assert_eq!(engine.process(0.3, None, f32::NAN), (0.3, 0.3));
        assert_eq!(engine.tap_output(1), Some((0.3, 0.3)));
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut engine = MultitapEngine::new(small_config());
        engine.set_knobs(0, Mode::Fx1, 0.3, 0.9);
        engine.set_knobs(META_COLUMN, Mode::Filter, 0.25, 0.75);
        engine.select_mode(0, Mode::Fx1);
        engine.set_input_gain(0.6);
        engine.set_phaser_noise_gain(0.2);
        engine.set_reverb_kind(ReverbKind::Fdn);
        engine.set_reverb_params(&ReverbParams {
            gravity: 0.8,
            ..ReverbParams::default()
        });

        let state = engine.snapshot();
        let mut other = MultitapEngine::new(small_config());
        other.restore(&state);
        assert_eq!(other.snapshot(), state);
        assert_eq!(other.knobs(0, Mode::Fx1), [0.3, 0.9]);
        assert_eq!(other.reverb_kind(), ReverbKind::Fdn);
    }

    #[test]
    fn test_default_snapshot_matches_default_state() {
        let engine = MultitapEngine::new(small_config());
        assert_eq!(engine.snapshot(), PersistedState::default());
    }

    #[test]
    fn test_restore_sanitizes() {
        let mut engine = MultitapEngine::new(small_config());
        let state = PersistedState {
            knobs: vec![f32::NAN; 3],
            selected_modes: [8; COLUMNS],
            input_gain: -4.0,
            reverb_mode: 99,
            ..PersistedState::default()
        };
        engine.restore(&state);
        let snap = engine.snapshot();
        assert!(snap.knobs.iter().all(|k| (0.0..=1.0).contains(k)));
        assert_eq!(snap.selected_modes, [0; COLUMNS]);
        assert_eq!(snap.input_gain, 0.0);
        assert_eq!(snap.reverb_mode, 0);
    }

    #[test]
    fn test_apply_shared_only_on_change() {
        let mut engine = MultitapEngine::new(small_config());
        let shared = SharedParams::default();
        assert!(engine.apply_shared(&shared));
        assert!(!engine.apply_shared(&shared));

        shared.set_knob(1, Mode::Delay, 1, 0.8);
        shared.select_mode(1, Mode::Delay);
        shared.set_reverb_kind(ReverbKind::Fdn);
        shared.set_phaser_noise_gain(0.3);
        assert!(engine.apply_shared(&shared));
        assert_eq!(engine.knobs(1, Mode::Delay)[1], 0.8);
        assert_eq!(engine.reverb_kind(), ReverbKind::Fdn);
        assert_eq!(engine.phaser_noise_gain(), 0.3);
        assert_eq!(engine.snapshot(), shared.to_state());
    }
}
