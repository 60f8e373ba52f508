//! Single-sideband frequency shifter.
//!
//! Frequency shifting moves every partial by the same number of Hz, unlike
//! pitch shifting which scales them. It needs the analytic signal of the
//! input: a real branch and a 90°-shifted imaginary branch, here built from
//! a 127-tap FIR Hilbert transformer and a matching 63-sample delay.
//!
//! ```text
//! in ─► HPF 40 Hz ─┬─► MatchingDelay ─► re ─┐
//!                  └─► FIR Hilbert ───► im ─┴─► re·cos φ − im·sin φ ─► mix ─► LPF ─► clip
//! ```
//!
//! The oscillator `(cos φ, sin φ)` is a rotating phasor updated with a
//! precomputed rotation `(cos Δ, sin Δ)`; Δ is recomputed every 16 samples
//! and the phasor renormalized every 512.

use core::f32::consts::{FRAC_PI_2, PI};
use libm::{cosf, sinf, sqrtf};
use multitap_core::{
    Biquad, HilbertPair, HilbertWindow, OnePole, Processor, SmoothedParam, bipolar, equal_power,
    highpass_coefficients, normalized, soft_clip_knee,
};

/// Shift at the bottom of the knob, in Hz.
pub const MIN_SHIFT_HZ: f32 = 50.0;
/// Shift at the top of the knob, in Hz.
pub const MAX_SHIFT_HZ: f32 = 5000.0;
/// Half-width of the bypass detent around the wet knob's center.
pub const WET_DETENT: f32 = 0.04;

const PRE_FILTER_HZ: f32 = 40.0;
const PRE_FILTER_Q: f32 = 0.707;
const WET_SMOOTHING_MS: f32 = 15.0;
const SHIFT_SMOOTHING_MS: f32 = 30.0;
const ROTATION_UPDATE_INTERVAL: u32 = 16;
const RENORMALIZE_INTERVAL: u32 = 512;
const CLIP_KNEE: f32 = 0.95;
const CLIP_CEILING: f32 = 1.0;

/// Rotating unit phasor.
#[derive(Debug, Clone, Copy)]
struct Phasor {
    c: f32,
    s: f32,
}

impl Phasor {
    const ZERO_PHASE: Self = Self { c: 1.0, s: 0.0 };

    #[inline]
    fn rotate(&mut self, cos_d: f32, sin_d: f32) {
        let c = self.c * cos_d - self.s * sin_d;
        let s = self.s * cos_d + self.c * sin_d;
        self.c = c;
        self.s = s;
    }

    fn renormalize(&mut self) {
        let mag = sqrtf(self.c * self.c + self.s * self.s);
        if mag.is_finite() && mag > 0.0 {
            self.c /= mag;
            self.s /= mag;
        } else {
            *self = Self::ZERO_PHASE;
        }
    }
}

/// One channel's analytic branch, filters and oscillator.
#[derive(Debug, Clone)]
struct ShifterChannel {
    pre: Biquad,
    pair: HilbertPair,
    post: OnePole,
    phasor: Phasor,
}

impl ShifterChannel {
    fn new(window: HilbertWindow) -> Self {
        Self {
            pre: Biquad::new(),
            pair: HilbertPair::new(window),
            post: OnePole::new(1.0),
            phasor: Phasor::ZERO_PHASE,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, cos_d: f32, sin_d: f32, dry: f32, wet: f32) -> f32 {
        let filtered = self.pre.process(input);
        self.phasor.rotate(cos_d, sin_d);
        let (re, im) = self.pair.process(filtered);
        let shifted = re * self.phasor.c - im * self.phasor.s;
        let mixed = dry * input + wet * shifted;
        let out = soft_clip_knee(self.post.process(mixed), CLIP_KNEE, CLIP_CEILING);
        if out.is_finite() { out } else { 0.0 }
    }

    fn reset(&mut self) {
        self.pre.clear();
        self.pair.reset();
        self.post.reset();
        self.phasor = Phasor::ZERO_PHASE;
    }
}

/// Stereo frequency shifter (FX1 mode).
///
/// ## Parameters
///
/// | Knob | Mapping |
/// |------|---------|
/// | p1 | shift magnitude `50 + 4950·p1²` Hz |
/// | p2 | signed wet `2·p2 − 1`; sign picks up/down shift, ±0.04 is a bypass detent |
///
/// Meta offsets are added to the normalized knobs before mapping.
///
/// # Example
///
/// ```rust
/// use multitap_effects::FrequencyShifter;
/// use multitap_core::Processor;
///
/// let mut shifter = FrequencyShifter::new();
/// shifter.set_params(1.0, 1.0, 0.0);
/// assert_eq!(shifter.target_shift_hz(), 5000.0);
/// assert_eq!(shifter.target_wet(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct FrequencyShifter {
    left: ShifterChannel,
    right: ShifterChannel,
    knob_shift: f32,
    knob_wet: f32,
    offset_shift: f32,
    offset_wet: f32,
    wet: SmoothedParam,
    signed_shift: SmoothedParam,
    last_sample_rate: f32,
    block_counter: u32,
    renormalize_counter: u32,
    cos_d: f32,
    sin_d: f32,
}

impl Default for FrequencyShifter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyShifter {
    /// Creates a bypassed shifter with the Nuttall-windowed Hilbert FIR.
    pub fn new() -> Self {
        Self::with_window(HilbertWindow::Nuttall)
    }

    /// Creates a bypassed shifter with the given Hilbert window.
    pub fn with_window(window: HilbertWindow) -> Self {
        let mut shifter = Self {
            left: ShifterChannel::new(window),
            right: ShifterChannel::new(window),
            knob_shift: 0.0,
            knob_wet: 0.5,
            offset_shift: 0.0,
            offset_wet: 0.0,
            wet: SmoothedParam::new(0.0),
            signed_shift: SmoothedParam::new(0.0),
            last_sample_rate: 0.0,
            block_counter: 0,
            renormalize_counter: 0,
            cos_d: 1.0,
            sin_d: 0.0,
        };
        shifter.update_targets();
        shifter
    }

    /// Shift magnitude for a normalized knob: `50 + 4950·k²` Hz.
    pub fn knob_to_shift_hz(knob: f32) -> f32 {
        MIN_SHIFT_HZ + (MAX_SHIFT_HZ - MIN_SHIFT_HZ) * knob * knob
    }

    /// Current shift magnitude target in Hz.
    pub fn target_shift_hz(&self) -> f32 {
        Self::knob_to_shift_hz((self.knob_shift + self.offset_shift).clamp(0.0, 1.0))
    }

    /// Wet target in [0, 1] (0 inside the detent).
    pub fn target_wet(&self) -> f32 {
        self.wet.target()
    }

    /// Signed shift target in Hz (0 inside the detent).
    pub fn target_signed_shift_hz(&self) -> f32 {
        self.signed_shift.target()
    }

    /// Smoothed signed shift currently applied, in Hz.
    pub fn current_shift_hz(&self) -> f32 {
        self.signed_shift.get()
    }

    fn update_targets(&mut self) {
        let shift = self.target_shift_hz();
        let wet_raw = (self.knob_wet + self.offset_wet).clamp(0.0, 1.0) * 2.0 - 1.0;
        if wet_raw.abs() < WET_DETENT {
            self.wet.set_target(0.0);
            self.signed_shift.set_target(0.0);
        } else {
            self.wet.set_target(wet_raw.abs());
            self.signed_shift.set_target(shift.copysign(wet_raw));
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        let coeffs = highpass_coefficients(PRE_FILTER_HZ, PRE_FILTER_Q, sample_rate);
        self.left.pre.set_coefficients(coeffs);
        self.right.pre.set_coefficients(coeffs);
        self.wet.set_sample_rate(sample_rate);
        self.wet.set_smoothing_time_ms(WET_SMOOTHING_MS);
        self.signed_shift.set_sample_rate(sample_rate);
        self.signed_shift.set_smoothing_time_ms(SHIFT_SMOOTHING_MS);
        self.last_sample_rate = sample_rate;
        // Force a rotation update at the new rate.
        self.block_counter = 0;
    }
}

impl Processor for FrequencyShifter {
    fn set_params(&mut self, p1: f32, p2: f32, _p3: f32) {
        self.knob_shift = normalized(p1, 0.0);
        self.knob_wet = normalized(p2, 0.5);
        self.update_targets();
    }

    fn set_offsets(&mut self, o1: f32, o2: f32) {
        self.offset_shift = bipolar(o1);
        self.offset_wet = bipolar(o2);
        self.update_targets();
    }

    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return;
        }
        if (sample_rate - self.last_sample_rate).abs() > 1.0 {
            self.set_sample_rate(sample_rate);
        }

        let wet = self.wet.advance();
        let shift = self.signed_shift.advance();

        if self.block_counter == 0 {
            self.block_counter = ROTATION_UPDATE_INTERVAL;
            let delta = 2.0 * PI * shift / sample_rate;
            self.cos_d = cosf(delta);
            self.sin_d = sinf(delta);
        }
        self.block_counter -= 1;

        let k = (1.0 - shift.abs() / MAX_SHIFT_HZ * 0.8).clamp(0.1, 1.0);
        self.left.post.set_coefficient(k);
        self.right.post.set_coefficient(k);

        let (g_dry, g_wet) = equal_power(FRAC_PI_2 * wet);
        *left = self.left.process(*left, self.cos_d, self.sin_d, g_dry, g_wet);
        *right = self.right.process(*right, self.cos_d, self.sin_d, g_dry, g_wet);

        self.renormalize_counter += 1;
        if self.renormalize_counter >= RENORMALIZE_INTERVAL {
            self.renormalize_counter = 0;
            self.left.phasor.renormalize();
            self.right.phasor.renormalize();
        }
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.wet.snap_to_target();
        self.signed_shift.snap_to_target();
        self.block_counter = 0;
        self.renormalize_counter = 0;
    }
}
