//! Modulated allpass for reverb diffusion.
//!
//! Canonical single-delay allpass with a fractional, per-sample delay:
//!
//! ```text
//! delayed = buffer[w - d]          (linear interpolation)
//! y       = g · x + delayed
//! buffer[w] = x - g · y
//! ```
//!
//! An optional one-pole on the delayed path darkens each recirculation
//! (damping); at zero damping the stage is a true allpass.

use crate::delay::{InterpolatedDelay, Interpolation};
use crate::flush_denormal;
use crate::one_pole::OnePole;

/// Allpass stage whose delay length can change every sample.
///
/// # Example
///
/// ```rust
/// use multitap_core::ModulatedAllpass;
///
/// let mut stage = ModulatedAllpass::new(4000);
/// stage.set_feedback(0.5);
/// let y = stage.process(1.0, 151.3);
/// assert_eq!(y, 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct ModulatedAllpass {
    delay: InterpolatedDelay,
    damping: OnePole,
    feedback: f32,
}

impl ModulatedAllpass {
    /// Creates a stage whose delay can reach `size - 2` samples.
    pub fn new(size: usize) -> Self {
        // One extra slot so the readable range is exactly [1, size - 2].
        let mut delay = InterpolatedDelay::new(size.max(3) + 1);
        delay.set_interpolation(Interpolation::Linear);
        Self {
            delay,
            damping: OnePole::new(1.0),
            feedback: 0.5,
        }
    }

    /// Sets the allpass coefficient `g`, clamped to [-0.999, 0.999].
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = if feedback.is_finite() {
            feedback.clamp(-0.999, 0.999)
        } else {
            0.0
        };
    }

    /// Allpass coefficient.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Sets damping in [0, 1]; 0 leaves the delayed path untouched.
    pub fn set_damping(&mut self, damping: f32) {
        self.damping.set_coefficient(1.0 - damping);
    }

    /// Longest usable delay in samples.
    pub fn max_delay(&self) -> f32 {
        self.delay.max_delay()
    }

    /// Processes one sample with a delay of `delay_samples` (clamped).
    #[inline]
    pub fn process(&mut self, input: f32, delay_samples: f32) -> f32 {
        let delayed = self.damping.process(self.delay.read(delay_samples));
        let output = self.feedback * input + delayed;
        self.delay.write(flush_denormal(input - self.feedback * output));
        output
    }

    /// Clears the delay memory and damping state.
    pub fn clear(&mut self) {
        self.delay.clear();
        self.damping.reset();
    }
}
