//! Biquad (bi-quadratic) filter structure.
//!
//! Second-order IIR used as the DC / sub-bass guard ahead of the Hilbert
//! pair in the frequency shifter. Coefficients follow the RBJ Audio EQ
//! Cookbook.

use core::f32::consts::PI;
use libm::{cosf, sinf};

/// Normalized biquad coefficients `(b0, b1, b2, a1, a2)` with `a0 = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward coefficients
    pub b0: f32,
    /// x[n-1] coefficient
    pub b1: f32,
    /// x[n-2] coefficient
    pub b2: f32,
    /// y[n-1] coefficient
    pub a1: f32,
    /// y[n-2] coefficient
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Identity (passthrough) coefficients.
    pub const PASSTHROUGH: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };
}

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
///
/// If the recursion ever produces a non-finite value the history is
/// cleared and the sample is returned as silence.
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: BiquadCoefficients,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            coeffs: BiquadCoefficients::PASSTHROUGH,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Replaces the coefficients, keeping the history.
    pub fn set_coefficients(&mut self, coeffs: BiquadCoefficients) {
        self.coeffs = coeffs;
    }

    /// Current coefficients.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coeffs
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2
            - c.a1 * self.y1
            - c.a2 * self.y2;

        if !output.is_finite() {
            self.clear();
            return 0.0;
        }

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = crate::flush_denormal(output);

        output
    }

    /// Clears the filter history.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// High-pass coefficients using the RBJ cookbook formula.
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz
/// * `q` - Q factor (0.707 for a Butterworth response)
/// * `sample_rate` - Sample rate in Hz
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = sin_omega / (2.0 * q);

    let a0 = 1.0 + alpha;
    let inv = 1.0 / a0;

    BiquadCoefficients {
        b0: (1.0 + cos_omega) / 2.0 * inv,
        b1: -(1.0 + cos_omega) * inv,
        b2: (1.0 + cos_omega) / 2.0 * inv,
        a1: -2.0 * cos_omega * inv,
        a2: (1.0 - alpha) * inv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_by_default() {
        let mut bq = Biquad::new();
        assert_eq!(bq.process(0.42), 0.42);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut bq = Biquad::new();
        bq.set_coefficients(highpass_coefficients(40.0, 0.707, 48000.0));
        let mut y = 1.0;
        for _ in 0..48000 {
            y = bq.process(1.0);
        }
        assert!(y.abs() < 1e-3, "dc leak {y}");
    }

    #[test]
    fn test_highpass_passes_midrange() {
        let mut bq = Biquad::new();
        bq.set_coefficients(highpass_coefficients(40.0, 0.707, 48000.0));
        let mut peak: f32 = 0.0;
        for i in 0..9600 {
            let y = bq.process(libm::sinf(2.0 * PI * 1000.0 * i as f32 / 48000.0));
            if i > 4800 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak > 0.98 && peak < 1.02, "peak {peak}");
    }

    #[test]
    fn test_non_finite_clears_history() {
        let mut bq = Biquad::new();
        bq.set_coefficients(highpass_coefficients(40.0, 0.707, 48000.0));
        assert_eq!(bq.process(f32::NAN), 0.0);
        assert!(bq.process(0.5).is_finite());
    }
}
