//! State Variable Filter and the base/width band filter built from it.
//!
//! The SVF is Andrew Simper's trapezoidal-integrated form (the "Cytomic"
//! SVF), which stays stable under per-sample coefficient changes and
//! delivers lowpass, bandpass and highpass from the same two integrators.
//!
//! # Coefficients
//!
//! ```text
//! g  = tan(π · min(f, 0.49))      f = cutoff / sample_rate
//! k  = 2 - 2 · res                res = 0 → Butterworth-like damping
//! a1 = 1 / (1 + g · (g + k))
//! a2 = g · a1
//! a3 = g · a2
//! ```
//!
//! # Reference
//!
//! Andrew Simper, "Linear Trap Integrated SVF", Cytomic technical paper, 2013.

use core::f32::consts::PI;
use libm::{exp2f, tanf};

use crate::math::flush_denormal;

/// Upper bound on normalized cutoff; keeps `tan` away from its pole.
const MAX_NORMALIZED_FREQ: f32 = 0.49;

/// The three simultaneous SVF responses for one input sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SvfOutputs {
    /// Lowpass response
    pub low: f32,
    /// Bandpass response
    pub band: f32,
    /// Highpass response
    pub high: f32,
}

/// Trapezoidal (Simper) state variable filter.
///
/// ## Parameters
/// - `normalized_freq`: cutoff divided by sample rate, clamped to [0, 0.49]
/// - `resonance`: 0.0 to 1.0 (maps to `k = 2 - 2·res`)
///
/// # Example
///
/// ```rust
/// use multitap_core::StateVariableFilter;
///
/// let mut svf = StateVariableFilter::new();
/// svf.set_params(1000.0 / 48000.0, 0.0);
/// let out = svf.process(0.5);
/// assert!(out.low.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    ic1eq: f32,
    ic2eq: f32,
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,
}

impl Default for StateVariableFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl StateVariableFilter {
    /// Creates a filter at 0.1 × sample rate with zero resonance.
    pub fn new() -> Self {
        let mut svf = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            k: 2.0,
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
        };
        svf.set_params(0.1, 0.0);
        svf
    }

    /// Recomputes the coefficients.
    pub fn set_params(&mut self, normalized_freq: f32, resonance: f32) {
        let f = if normalized_freq.is_finite() {
            normalized_freq.clamp(0.0, MAX_NORMALIZED_FREQ)
        } else {
            MAX_NORMALIZED_FREQ
        };
        let res = if resonance.is_finite() {
            resonance.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let g = tanf(PI * f);
        self.k = 2.0 - 2.0 * res;
        self.a1 = 1.0 / (1.0 + g * (g + self.k));
        self.a2 = g * self.a1;
        self.a3 = g * self.a2;
    }

    /// Processes one sample and returns all three responses.
    #[inline]
    pub fn process(&mut self, input: f32) -> SvfOutputs {
        let v3 = input - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;

        self.ic1eq = flush_denormal(2.0 * v1 - self.ic1eq);
        self.ic2eq = flush_denormal(2.0 * v2 - self.ic2eq);

        if !(self.ic1eq.is_finite() && self.ic2eq.is_finite()) {
            self.reset();
            return SvfOutputs::default();
        }

        SvfOutputs {
            low: v2,
            band: v1,
            high: input - self.k * v1 - v2,
        }
    }

    /// Clears the integrator state.
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

/// Band filter defined by a base frequency and a width in octaves.
///
/// Two SVFs share the input. The lowpass of the lower edge and the highpass
/// of the upper edge are subtracted from the input, which leaves the band
/// between `base` and `base · 2^octaves`:
///
/// ```text
/// f1      = base / sr
/// octaves = width / 100 · 10
/// f2      = base · 2^octaves / sr
/// out     = x - (lowpass(f1) + highpass(f2))
/// ```
///
/// Coefficients are only recomputed when sample rate, base or width change.
#[derive(Debug, Clone)]
pub struct BaseWidthFilter {
    lower: StateVariableFilter,
    upper: StateVariableFilter,
    sample_rate: f32,
    base_hz: f32,
    width: f32,
}

impl Default for BaseWidthFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseWidthFilter {
    /// Width value (0..=100) that spans ten octaves.
    pub const MAX_WIDTH: f32 = 100.0;
    /// Octave span at full width.
    pub const MAX_OCTAVES: f32 = 10.0;

    /// Creates an unconfigured filter; the first `set_params` computes coefficients.
    pub fn new() -> Self {
        Self {
            lower: StateVariableFilter::new(),
            upper: StateVariableFilter::new(),
            sample_rate: -1.0,
            base_hz: -1.0,
            width: -1.0,
        }
    }

    /// Updates the band edges, recomputing only on change.
    pub fn set_params(&mut self, sample_rate: f32, base_hz: f32, width: f32) {
        if sample_rate == self.sample_rate && base_hz == self.base_hz && width == self.width {
            return;
        }
        self.sample_rate = sample_rate;
        self.base_hz = base_hz;
        self.width = width;

        if sample_rate < 1.0 {
            return;
        }

        let octaves = width.clamp(0.0, Self::MAX_WIDTH) / Self::MAX_WIDTH * Self::MAX_OCTAVES;
        let f1 = base_hz / sample_rate;
        let f2 = base_hz * exp2f(octaves) / sample_rate;
        self.lower.set_params(f1, 0.0);
        self.upper.set_params(f2, 0.0);
    }

    /// Lower band edge in Hz.
    pub fn base_hz(&self) -> f32 {
        self.base_hz
    }

    /// Upper band edge in Hz.
    pub fn upper_hz(&self) -> f32 {
        let octaves = self.width.clamp(0.0, Self::MAX_WIDTH) / Self::MAX_WIDTH * Self::MAX_OCTAVES;
        self.base_hz * exp2f(octaves)
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let low = self.lower.process(input).low;
        let high = self.upper.process(input).high;
        input - (low + high)
    }

    /// Clears both filters.
    pub fn reset(&mut self) {
        self.lower.reset();
        self.upper.reset();
    }
}
