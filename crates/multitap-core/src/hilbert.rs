//! FIR Hilbert transformer and its matching delay.
//!
//! An analytic signal needs two branches that are 90° apart across the
//! audio band. The "imaginary" branch is a windowed ideal Hilbert kernel:
//!
//! ```text
//! h[k] = 2 / (π·k)   for odd k
//! h[k] = 0           for even k (including k = 0)
//! k    = n - M,      M = (TAPS - 1) / 2
//! ```
//!
//! The causal FIR delays its output by `M` samples, so the "real" branch
//! runs through a pure [`MatchingDelay`] of exactly `M` samples.

use core::f32::consts::PI;
use libm::cosf;

use crate::delay::FixedDelayLine;

/// Number of FIR taps (odd).
pub const HILBERT_TAPS: usize = 127;

/// Group delay of the FIR in samples.
pub const HILBERT_DELAY: usize = (HILBERT_TAPS - 1) / 2;

/// Window applied to the ideal kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HilbertWindow {
    /// 4-term Nuttall (lowest sidelobes)
    #[default]
    Nuttall,
    /// 3-term Blackman
    Blackman,
}

impl HilbertWindow {
    /// Window value at tap `n` of `HILBERT_TAPS`.
    fn weight(self, n: usize) -> f32 {
        let x = n as f32 / (HILBERT_TAPS - 1) as f32;
        match self {
            Self::Nuttall => {
                const A0: f32 = 0.355_768;
                const A1: f32 = 0.487_396;
                const A2: f32 = 0.144_232;
                const A3: f32 = 0.012_604;
                A0 - A1 * cosf(2.0 * PI * x) + A2 * cosf(4.0 * PI * x) - A3 * cosf(6.0 * PI * x)
            }
            Self::Blackman => 0.42 - 0.5 * cosf(2.0 * PI * x) + 0.08 * cosf(4.0 * PI * x),
        }
    }
}

/// Windowed FIR Hilbert transformer.
///
/// # Example
///
/// ```rust
/// use multitap_core::{FirHilbert, HilbertWindow};
///
/// let hilbert = FirHilbert::new(HilbertWindow::Nuttall);
/// assert_eq!(hilbert.kernel()[63], 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct FirHilbert {
    kernel: [f32; HILBERT_TAPS],
    history: [f32; HILBERT_TAPS],
    pos: usize,
}

impl Default for FirHilbert {
    fn default() -> Self {
        Self::new(HilbertWindow::default())
    }
}

impl FirHilbert {
    /// Builds the kernel for the given window.
    pub fn new(window: HilbertWindow) -> Self {
        let mut kernel = [0.0; HILBERT_TAPS];
        for (n, tap) in kernel.iter_mut().enumerate() {
            let k = n as i32 - HILBERT_DELAY as i32;
            if k % 2 != 0 {
                *tap = 2.0 / (PI * k as f32) * window.weight(n);
            }
        }
        Self {
            kernel,
            history: [0.0; HILBERT_TAPS],
            pos: 0,
        }
    }

    /// Kernel taps, index 0 is applied to the newest sample.
    pub fn kernel(&self) -> &[f32; HILBERT_TAPS] {
        &self.kernel
    }

    /// Pushes one sample and returns the 90°-shifted output (delayed by `M`).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.history[self.pos] = input;

        // y[n] = Σ h[i] · x[n - i]; walk the ring backwards from the newest sample.
        let mut acc = 0.0;
        let mut idx = self.pos;
        for tap in &self.kernel {
            acc += tap * self.history[idx];
            idx = if idx == 0 { HILBERT_TAPS - 1 } else { idx - 1 };
        }

        self.pos += 1;
        if self.pos == HILBERT_TAPS {
            self.pos = 0;
        }
        acc
    }

    /// Clears the history.
    pub fn reset(&mut self) {
        self.history = [0.0; HILBERT_TAPS];
        self.pos = 0;
    }
}

/// Pure delay aligning the real branch with the Hilbert group delay.
pub type MatchingDelay = FixedDelayLine<HILBERT_DELAY>;

/// One channel's analytic-signal generator: `(real, imaginary)` per sample.
#[derive(Debug, Clone, Default)]
pub struct HilbertPair {
    hilbert: FirHilbert,
    delay: MatchingDelay,
}

impl HilbertPair {
    /// Creates a pair using `window` for the FIR.
    pub fn new(window: HilbertWindow) -> Self {
        Self {
            hilbert: FirHilbert::new(window),
            delay: MatchingDelay::new(),
        }
    }

    /// Returns `(real, imaginary)` for this input sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        (self.delay.process(input), self.hilbert.process(input))
    }

    /// Clears both branches.
    pub fn reset(&mut self) {
        self.hilbert.reset();
        self.delay.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::sinf;

    #[test]
    fn test_kernel_zero_at_even_offsets() {
        let h = FirHilbert::new(HilbertWindow::Nuttall);
        for (n, &tap) in h.kernel().iter().enumerate() {
            let k = n as i32 - HILBERT_DELAY as i32;
            if k % 2 == 0 {
                assert_eq!(tap, 0.0, "tap {n}");
            } else {
                assert!(tap != 0.0, "tap {n}");
            }
        }
    }

    #[test]
    fn test_kernel_antisymmetric() {
        for window in [HilbertWindow::Nuttall, HilbertWindow::Blackman] {
            let h = FirHilbert::new(window);
            let kern = h.kernel();
            for i in 0..HILBERT_TAPS {
                assert!((kern[i] + kern[HILBERT_TAPS - 1 - i]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_matching_delay_length() {
        let d = MatchingDelay::new();
        assert_eq!(d.len(), 63);
    }

    #[test]
    fn test_pair_is_in_quadrature() {
        // Inside the passband a sine comes out as (sin, -cos): equal energy,
        // near-zero correlation.
        let sr = 48000.0;
        let mut pair = HilbertPair::new(HilbertWindow::Nuttall);
        let mut re_energy = 0.0;
        let mut im_energy = 0.0;
        let mut cross = 0.0;
        for i in 0..4800 {
            let x = sinf(2.0 * PI * 6000.0 * i as f32 / sr);
            let (re, im) = pair.process(x);
            if i > 480 {
                re_energy += re * re;
                im_energy += im * im;
                cross += re * im;
            }
        }
        let ratio = im_energy / re_energy;
        assert!((ratio - 1.0).abs() < 0.03, "energy ratio {ratio}");
        assert!((cross / re_energy).abs() < 0.03, "correlation {}", cross / re_energy);
    }
}
