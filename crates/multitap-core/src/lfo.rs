//! Sine LFO for delay-time and cutoff modulation.
//!
//! A phase accumulator in cycles. Several consumers can read the same
//! phase at fixed offsets (the diffusion reverb spreads 32 stages over one
//! cycle, the phaser reads its right channel a quarter cycle ahead).

use core::f32::consts::TAU;
use libm::{floorf, sinf};

/// Phase-accumulating sine oscillator.
///
/// # Example
///
/// ```rust
/// use multitap_core::Lfo;
///
/// let mut lfo = Lfo::new();
/// lfo.advance(12000.0, 48000.0); // a quarter cycle
/// assert!((lfo.sine() - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Lfo {
    /// Current phase position [0.0, 1.0)
    phase: f32,
}

impl Lfo {
    /// Creates an LFO at phase 0.
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Advances by `freq_hz / sample_rate` cycles. Ignored for rates below 1 Hz.
    #[inline]
    pub fn advance(&mut self, freq_hz: f32, sample_rate: f32) {
        if sample_rate < 1.0 || !freq_hz.is_finite() {
            return;
        }
        self.phase += freq_hz / sample_rate;
        if self.phase >= 1.0 || self.phase < 0.0 {
            self.phase -= floorf(self.phase);
        }
    }

    /// Current phase in cycles.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Sets the phase (wrapped into [0, 1)).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = if phase.is_finite() { phase - floorf(phase) } else { 0.0 };
    }

    /// `sin(2π · phase)`.
    #[inline]
    pub fn sine(&self) -> f32 {
        sinf(self.phase * TAU)
    }

    /// `sin(2π · (phase + offset))`.
    #[inline]
    pub fn sine_at(&self, offset: f32) -> f32 {
        sinf((self.phase + offset) * TAU)
    }

    /// Rewinds to phase 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
