//! Stereo phaser with cascaded allpass stages and pink-noise injection.
//!
//! A phaser mixes the input with a phase-shifted copy of itself. The phase
//! shift comes from a cascade of first-order allpass filters whose break
//! frequency is swept by a sine LFO, so the resulting notches move through
//! the spectrum. Feedback around the cascade deepens the notches.

use core::f32::consts::{FRAC_PI_2, PI};
use libm::{exp2f, expf, logf, tanf};
use multitap_core::{
    Lfo, PinkNoise, Processor, SmoothedParam, bipolar, equal_power, flush_denormal, normalized,
    soft_clip_knee,
};

/// Maximum number of allpass stages.
pub const MAX_STAGES: usize = 12;
/// Minimum number of allpass stages.
pub const MIN_STAGES: usize = 8;

const BASE_FREQ_HZ: f32 = 800.0;
const MIN_CUTOFF_HZ: f32 = 20.0;
const MAX_CUTOFF_RATIO: f32 = 0.45;
const MIN_LFO_HZ: f32 = 0.1;
const MAX_LFO_HZ: f32 = 20.0;
const RANGE_OCTAVES_PER_DEPTH: f32 = 4.0;
const MAX_FEEDBACK: f32 = 0.94;
const NOISE_SCALE: f32 = 0.4;
const SMOOTHING_MS: f32 = 15.0;
/// Right channel LFO lead in cycles (90°).
const STEREO_PHASE_OFFSET: f32 = 0.25;
const CLIP_KNEE: f32 = 0.95;
const CLIP_CEILING: f32 = 1.0;

/// First-order allpass `y = a·x + z1; z1 = x − a·y`.
#[derive(Debug, Clone, Copy, Default)]
struct AllpassStage {
    z1: f32,
}

impl AllpassStage {
    #[inline]
    fn process(&mut self, input: f32, a: f32) -> f32 {
        let output = a * input + self.z1;
        self.z1 = flush_denormal(input - a * output);
        output
    }
}

/// One channel's allpass cascade with its feedback memory.
#[derive(Debug, Clone)]
struct PhaserChannel {
    stages: [AllpassStage; MAX_STAGES],
    feedback: f32,
    noise: PinkNoise,
}

impl PhaserChannel {
    fn new(seed: u32) -> Self {
        Self {
            stages: [AllpassStage::default(); MAX_STAGES],
            feedback: 0.0,
            noise: PinkNoise::new(seed),
        }
    }

    #[inline]
    fn process(&mut self, input: f32, a: f32, active: usize, fb_amount: f32, noise_amount: f32) -> f32 {
        let mut wet = input + self.feedback * fb_amount + self.noise.next_sample() * noise_amount;
        for stage in &mut self.stages[..active] {
            wet = stage.process(wet, a);
        }
        if wet.is_finite() {
            self.feedback = wet;
            wet
        } else {
            self.reset();
            0.0
        }
    }

    fn reset(&mut self) {
        self.stages = [AllpassStage::default(); MAX_STAGES];
        self.feedback = 0.0;
        self.noise.reset();
    }
}

/// Stereo phaser (FX2 mode).
///
/// ## Parameters
///
/// | Knob | Mapping |
/// |------|---------|
/// | p1 | LFO rate, `0.1 · 200^p1` Hz (log) |
/// | p2 | depth: sweep range `4·depth` octaves, feedback `0.94·depth`, mix `0.5·depth²` |
/// | p3 | pink-noise gain, injected at `pink · gain · 0.4 · depth` |
///
/// Meta offsets are added to the normalized rate and depth knobs.
///
/// # Example
///
/// ```rust
/// use multitap_effects::Phaser;
/// use multitap_core::Processor;
///
/// let mut phaser = Phaser::new();
/// phaser.set_params(0.5, 0.8, 0.0);
/// let (mut l, mut r) = (0.25, 0.25);
/// phaser.process(&mut l, &mut r, 48000.0);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Phaser {
    left: PhaserChannel,
    right: PhaserChannel,
    lfo: Lfo,
    freq: SmoothedParam,
    depth: SmoothedParam,
    noise_gain: SmoothedParam,
    knob_rate: f32,
    knob_depth: f32,
    offset_rate: f32,
    offset_depth: f32,
    stages: usize,
    last_sample_rate: f32,
}

impl Default for Phaser {
    fn default() -> Self {
        Self::new()
    }
}

impl Phaser {
    /// Creates a 12-stage phaser at 1 Hz, half depth, no noise.
    pub fn new() -> Self {
        let mut phaser = Self {
            left: PhaserChannel::new(0x0BAD_5EED),
            right: PhaserChannel::new(0x5EED_0BAD),
            lfo: Lfo::new(),
            freq: SmoothedParam::new(1.0),
            depth: SmoothedParam::new(0.5),
            noise_gain: SmoothedParam::new(0.0),
            knob_rate: 0.0,
            knob_depth: 0.5,
            offset_rate: 0.0,
            offset_depth: 0.0,
            stages: MAX_STAGES,
            last_sample_rate: 0.0,
        };
        phaser.knob_rate = Self::hz_to_knob(1.0);
        phaser
    }

    /// Sets the number of active allpass stages (clamped to 8..=12).
    pub fn set_stages(&mut self, stages: usize) {
        self.stages = stages.clamp(MIN_STAGES, MAX_STAGES);
    }

    /// Number of active allpass stages.
    pub fn stages(&self) -> usize {
        self.stages
    }

    /// LFO rate for a normalized knob, log-mapped over 0.1–20 Hz.
    pub fn knob_to_hz(knob: f32) -> f32 {
        let lo = logf(MIN_LFO_HZ);
        let hi = logf(MAX_LFO_HZ);
        expf(lo + knob * (hi - lo))
    }

    fn hz_to_knob(hz: f32) -> f32 {
        let lo = logf(MIN_LFO_HZ);
        let hi = logf(MAX_LFO_HZ);
        (logf(hz) - lo) / (hi - lo)
    }

    /// Target LFO rate in Hz.
    pub fn target_rate_hz(&self) -> f32 {
        self.freq.target()
    }

    /// Target depth in [0, 1].
    pub fn target_depth(&self) -> f32 {
        self.depth.target()
    }

    /// Target pink-noise gain in [0, 1].
    pub fn target_noise_gain(&self) -> f32 {
        self.noise_gain.target()
    }

    /// Allpass coefficient for a swept cutoff.
    #[inline]
    fn coefficient(lfo: f32, range_octaves: f32, sample_rate: f32) -> f32 {
        let cutoff = (BASE_FREQ_HZ * exp2f(lfo * range_octaves * 0.5))
            .clamp(MIN_CUTOFF_HZ, sample_rate * MAX_CUTOFF_RATIO);
        let t = tanf(PI * cutoff / sample_rate);
        (1.0 - t) / (1.0 + t)
    }

    fn update_targets(&mut self) {
        let rate = (self.knob_rate + self.offset_rate).clamp(0.0, 1.0);
        let depth = (self.knob_depth + self.offset_depth).clamp(0.0, 1.0);
        self.freq.set_target(Self::knob_to_hz(rate));
        self.depth.set_target(depth);
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        for param in [&mut self.freq, &mut self.depth, &mut self.noise_gain] {
            param.set_sample_rate(sample_rate);
            param.set_smoothing_time_ms(SMOOTHING_MS);
        }
        self.last_sample_rate = sample_rate;
    }
}

impl Processor for Phaser {
    fn set_params(&mut self, p1: f32, p2: f32, p3: f32) {
        self.knob_rate = normalized(p1, 0.5);
        self.knob_depth = normalized(p2, 0.5);
        self.noise_gain.set_target(normalized(p3, 0.0));
        self.update_targets();
    }

    fn set_offsets(&mut self, o1: f32, o2: f32) {
        self.offset_rate = bipolar(o1);
        self.offset_depth = bipolar(o2);
        self.update_targets();
    }

    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return;
        }
        if (sample_rate - self.last_sample_rate).abs() > 1.0 {
            self.set_sample_rate(sample_rate);
        }

        let freq = self.freq.advance();
        let depth = self.depth.advance();
        let noise_gain = self.noise_gain.advance();

        self.lfo.advance(freq, sample_rate);
        let range = RANGE_OCTAVES_PER_DEPTH * depth;
        let a_l = Self::coefficient(self.lfo.sine(), range, sample_rate);
        let a_r = Self::coefficient(self.lfo.sine_at(STEREO_PHASE_OFFSET), range, sample_rate);

        let fb_amount = MAX_FEEDBACK * depth;
        let noise_amount = noise_gain * NOISE_SCALE * depth;

        let wet_l = self.left.process(*left, a_l, self.stages, fb_amount, noise_amount);
        let wet_r = self.right.process(*right, a_r, self.stages, fb_amount, noise_amount);

        let mix_ratio = depth * depth * 0.5;
        let (g_dry, g_wet) = equal_power(FRAC_PI_2 * mix_ratio);

        let out_l = soft_clip_knee(g_dry * *left + g_wet * wet_l, CLIP_KNEE, CLIP_CEILING);
        let out_r = soft_clip_knee(g_dry * *right + g_wet * wet_r, CLIP_KNEE, CLIP_CEILING);
        *left = if out_l.is_finite() { out_l } else { 0.0 };
        *right = if out_r.is_finite() { out_r } else { 0.0 };
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.lfo.reset();
        self.freq.snap_to_target();
        self.depth.snap_to_target();
        self.noise_gain.snap_to_target();
    }
}
