//! One-pole lowpass used for damping and post-shift smoothing.
//!
//! ```text
//! y[n] = y[n-1] + k · (x[n] - y[n-1])
//! ```
//!
//! `k = 1` passes the input through, smaller `k` darkens. The coefficient
//! can be set directly (the frequency shifter derives it from the shift
//! amount) or from a cutoff frequency via `k = 1 - exp(-2π·f/sr)`.
//!
//! # Usage
//!
//! ```rust
//! use multitap_core::OnePole;
//!
//! let mut lp = OnePole::with_frequency(48000.0, 4000.0);
//! let filtered = lp.process(1.0);
//! assert!(filtered < 1.0);
//! ```
//!
//! # Reference
//!
//! Julius O. Smith III, "Introduction to Digital Filters with Audio Applications",
//! Section: One-Pole Filter.

use crate::flush_denormal;
use libm::expf;

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Invariants
///
/// - `k` is kept in [0, 1]
/// - `state` is flushed to zero when below 1e-20 and reset when non-finite
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    k: f32,
}

impl Default for OnePole {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl OnePole {
    /// Create a filter with a direct smoothing coefficient.
    pub fn new(k: f32) -> Self {
        let mut filter = Self { state: 0.0, k: 1.0 };
        filter.set_coefficient(k);
        filter
    }

    /// Create a filter with a cutoff in Hz.
    pub fn with_frequency(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self::new(1.0);
        filter.set_frequency(sample_rate, freq_hz);
        filter
    }

    /// Set `k` directly, clamped to [0, 1].
    #[inline]
    pub fn set_coefficient(&mut self, k: f32) {
        self.k = if k.is_finite() { k.clamp(0.0, 1.0) } else { 1.0 };
    }

    /// Set `k` from a cutoff frequency.
    pub fn set_frequency(&mut self, sample_rate: f32, freq_hz: f32) {
        if sample_rate < 1.0 {
            return;
        }
        self.set_coefficient(1.0 - expf(-core::f32::consts::TAU * freq_hz / sample_rate));
    }

    /// Current coefficient.
    pub fn coefficient(&self) -> f32 {
        self.k
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(self.state + self.k * (input - self.state));
        if !self.state.is_finite() {
            self.state = 0.0;
        }
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}
