//! Feedback delay network reverb.
//!
//! Two networks run in parallel on the mono input:
//!
//! - 4 lines (1499, 1889, 2381, 2999 samples): sparse, early-reflection like
//! - 8 lines (809 … 1499 samples): dense late field
//!
//! Each network recirculates through an orthogonal matrix `A = exp(S)` so the
//! loop itself is lossless; decay comes only from the per-line gains
//! `g_i = 10^(−3·d_i / (sr · T60))`, which makes every line lose 60 dB in
//! exactly `T60` seconds regardless of its length. The density control
//! crossfades the two network outputs at constant power.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::array;
use core::f32::consts::FRAC_PI_2;

use libm::powf;
use multitap_core::matrix::orthogonal_from_skew;
use multitap_core::{REVERB_SLEW, SlewedParam, equal_power, flush_denormal};

use super::{ReverbEngine, ReverbParams};

const DELAYS_4: [usize; 4] = [1499, 1889, 2381, 2999];
const DELAYS_8: [usize; 8] = [809, 877, 937, 1049, 1151, 1249, 1373, 1499];

const SKEW_4: [f32; 6] = [-0.5182, 0.2144, 0.1097, 0.3421, -0.1985, 0.4210];
const SKEW_8: [f32; 28] = [
    0.1245, -0.3210, 0.0541, 0.1892, -0.0123, 0.2104, -0.0981, 0.4321, -0.1120, 0.0876, 0.3129,
    -0.2451, 0.0154, 0.1982, -0.4012, 0.0651, 0.1239, -0.1872, 0.2871, -0.1092, 0.3341, 0.0452,
    0.0912, -0.2210, 0.1763, 0.3101, -0.0542, 0.1987,
];

const MIN_T60: f32 = 0.1;
const T60_SPAN: f32 = 9.9;

/// Reverb time in seconds for a normalized decay knob: `0.1 + 9.9·decay²`.
pub fn decay_to_t60(decay: f32) -> f32 {
    let decay = decay.clamp(0.0, 1.0);
    MIN_T60 + T60_SPAN * decay * decay
}

/// One `N`-line network with its orthogonal feedback matrix.
#[derive(Debug, Clone)]
struct Network<const N: usize> {
    lines: [Vec<f32>; N],
    pos: [usize; N],
    delays: [usize; N],
    gains: [f32; N],
    matrix: Vec<f32>,
}

impl<const N: usize> Network<N> {
    fn new(delays: [usize; N], skew: &[f32]) -> Self {
        Self {
            // Ring length equals the delay, so the slot about to be
            // overwritten is exactly `d_i` samples old.
            lines: array::from_fn(|i| vec![0.0; delays[i]]),
            pos: [0; N],
            delays,
            gains: [1.0; N],
            matrix: orthogonal_from_skew(skew, N),
        }
    }

    fn update_gains(&mut self, sample_rate: f32, t60: f32) {
        for (gain, &delay) in self.gains.iter_mut().zip(&self.delays) {
            *gain = powf(10.0, -3.0 * delay as f32 / (sample_rate * t60));
        }
    }

    /// Advances one sample and returns the mean of the delayed outputs.
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed: [f32; N] = array::from_fn(|i| self.lines[i][self.pos[i]]);

        let mut sum = 0.0;
        for i in 0..N {
            let row = &self.matrix[i * N..(i + 1) * N];
            let mixed: f32 = row.iter().zip(&delayed).map(|(a, x)| a * x).sum();
            self.lines[i][self.pos[i]] = flush_denormal(input + mixed * self.gains[i]);
            self.pos[i] += 1;
            if self.pos[i] == self.delays[i] {
                self.pos[i] = 0;
            }
            sum += delayed[i];
        }
        sum / N as f32
    }

    fn energy(&self) -> f32 {
        self.lines.iter().flatten().map(|v| v * v).sum()
    }

    fn clear(&mut self) {
        for line in &mut self.lines {
            line.fill(0.0);
        }
        self.pos = [0; N];
    }
}

/// 4- and 8-line FDN with a density crossfade.
///
/// Reads `gravity` as the decay knob (`T60 = 0.1 + 9.9·gravity²` s),
/// `diffusion` as density (0 = 4-line only, 1 = 8-line only) and `mix` as
/// the wet level added to the dry signal. The input is summed to mono; the
/// wet signal is identical on both channels.
///
/// # Example
///
/// ```rust
/// use multitap_effects::{FdnReverb, ReverbParams};
/// use multitap_effects::reverb::ReverbEngine;
///
/// let mut fdn = FdnReverb::new();
/// fdn.set_params(&ReverbParams { gravity: 0.8, ..ReverbParams::default() });
/// let (mut l, mut r) = (1.0, 0.0);
/// fdn.process(&mut l, &mut r, 44100.0);
/// // Nothing has travelled round the lines yet.
/// assert_eq!((l, r), (1.0, 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct FdnReverb {
    sparse: Network<4>,
    dense: Network<8>,
    t60: SlewedParam,
    density: SlewedParam,
    mix: SlewedParam,
    gains_t60: f32,
    gains_sample_rate: f32,
}

impl Default for FdnReverb {
    fn default() -> Self {
        Self::new()
    }
}

impl FdnReverb {
    /// Allocates both networks and computes their matrices.
    pub fn new() -> Self {
        let p = ReverbParams::default();
        Self {
            sparse: Network::new(DELAYS_4, &SKEW_4),
            dense: Network::new(DELAYS_8, &SKEW_8),
            t60: SlewedParam::new(decay_to_t60(p.gravity), REVERB_SLEW),
            density: SlewedParam::new(p.diffusion, REVERB_SLEW),
            mix: SlewedParam::new(p.mix, REVERB_SLEW),
            gains_t60: 0.0,
            gains_sample_rate: 0.0,
        }
    }

    /// Target reverb time in seconds.
    pub fn target_t60(&self) -> f32 {
        self.t60.target()
    }

    /// Current (slewed) reverb time in seconds.
    pub fn current_t60(&self) -> f32 {
        self.t60.get()
    }

    /// Sum of squares of everything held in both networks.
    pub fn stored_energy(&self) -> f32 {
        self.sparse.energy() + self.dense.energy()
    }
}

impl ReverbEngine for FdnReverb {
    fn set_params(&mut self, params: &ReverbParams) {
        let p = params.clamped();
        self.t60.set_target(decay_to_t60(p.gravity));
        self.density.set_target(p.diffusion);
        self.mix.set_target(p.mix);
    }

    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return;
        }
        let (dry_l, dry_r) = (*left, *right);

        let t60 = self.t60.advance();
        let density = self.density.advance();
        let mix = self.mix.advance();

        if t60 != self.gains_t60 || sample_rate != self.gains_sample_rate {
            self.sparse.update_gains(sample_rate, t60);
            self.dense.update_gains(sample_rate, t60);
            self.gains_t60 = t60;
            self.gains_sample_rate = sample_rate;
        }

        let input = (dry_l + dry_r) * 0.5;
        let out_sparse = self.sparse.process(input);
        let out_dense = self.dense.process(input);

        let (w_sparse, w_dense) = equal_power(density * FRAC_PI_2);
        let wet = out_sparse * w_sparse + out_dense * w_dense;

        let out_l = dry_l + mix * wet;
        let out_r = dry_r + mix * wet;
        *left = if out_l.is_finite() { out_l } else { dry_l };
        *right = if out_r.is_finite() { out_r } else { dry_r };
        if !(out_l.is_finite() && out_r.is_finite()) {
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.sparse.clear();
        self.dense.clear();
    }
}
