//! DC blocking filter for reverb outputs.
//!
//! Uses a first-order highpass (Julius O. Smith's DC blocker).
//! Transfer function: H(z) = (1 - z^-1) / (1 - R*z^-1)
//!
//! The diffusion reverb uses R = 0.992, about 61 Hz at 48 kHz, which also
//! trims the low-frequency build-up of long allpass chains.
//!
//! Reference: Julius O. Smith, "Introduction to Digital Filters with Audio
//! Applications", Chapter on DC Blocker.

/// DC blocking filter using a first-order highpass.
///
/// ## Transfer Function
///
/// ```text
/// H(z) = (1 - z^-1) / (1 - R * z^-1)
/// ```
///
/// ## Example
///
/// ```rust
/// use multitap_core::DcBlocker;
///
/// let mut blocker = DcBlocker::with_coeff(0.992);
/// let mut y = 0.0;
/// for _ in 0..5000 {
///     y = blocker.process(0.5);
/// }
/// assert!(y.abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct DcBlocker {
    /// R coefficient (pole position)
    coeff: f32,
    x_prev: f32,
    y_prev: f32,
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::with_coeff(Self::REVERB_COEFF)
    }
}

impl DcBlocker {
    /// Pole used by the diffusion reverb output.
    pub const REVERB_COEFF: f32 = 0.992;

    /// Create a DC blocker with a specific R coefficient, clamped to [0.9, 0.9999].
    pub fn with_coeff(coeff: f32) -> Self {
        Self {
            coeff: coeff.clamp(0.9, 0.9999),
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// y[n] = x[n] - x[n-1] + R * y[n-1]
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = crate::flush_denormal(input - self.x_prev + self.coeff * self.y_prev);
        if !output.is_finite() {
            self.reset();
            return 0.0;
        }
        self.x_prev = input;
        self.y_prev = output;
        output
    }

    /// Reset the filter state to zero.
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    /// The R coefficient.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_constant_offset() {
        let mut dc = DcBlocker::default();
        let mut y = 1.0;
        for _ in 0..10_000 {
            y = dc.process(1.0);
        }
        assert!(y.abs() < 1e-4);
    }

    #[test]
    fn test_first_sample_passes() {
        let mut dc = DcBlocker::default();
        assert_eq!(dc.process(0.7), 0.7);
    }

    #[test]
    fn test_coeff_clamped() {
        assert_eq!(DcBlocker::with_coeff(2.0).coeff(), 0.9999);
        assert_eq!(DcBlocker::with_coeff(0.1).coeff(), 0.9);
    }

    #[test]
    fn test_non_finite_resets() {
        let mut dc = DcBlocker::default();
        assert_eq!(dc.process(f32::INFINITY), 0.0);
        assert_eq!(dc.process(0.25), 0.25);
    }
}
