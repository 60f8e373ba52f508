//! Gain and pan laws shared by the amp/pan stage and the input macro.
//!
//! # Gain
//!
//! A normalized knob maps linearly in dB:
//!
//! ```text
//! dB = k · 78 - 72        k ∈ [0, 1]  →  [-72 dB, +6 dB]
//! ```
//!
//! so unity gain sits at `k = 72/78` ([`UNITY_GAIN_KNOB`]).
//!
//! # Pan
//!
//! Constant-power law over a quarter circle:
//!
//! ```text
//! angle = (pan + 1) / 2 · π/2     pan ∈ [-1, 1]
//! left  = cos(angle)
//! right = sin(angle)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use multitap_core::gain;
//!
//! assert!((gain::knob_to_db(gain::UNITY_GAIN_KNOB)).abs() < 1e-4);
//! let (l, r) = gain::constant_power_pan(0.0);
//! assert!((l - r).abs() < 1e-6);
//! ```

use core::f32::consts::FRAC_PI_2;
use libm::{cosf, sinf};

/// Lowest gain reachable from the knob.
pub const KNOB_MIN_DB: f32 = -72.0;

/// Highest gain reachable from the knob.
pub const KNOB_MAX_DB: f32 = 6.0;

/// Knob span in dB.
pub const KNOB_RANGE_DB: f32 = KNOB_MAX_DB - KNOB_MIN_DB;

/// Knob position that yields 0 dB.
pub const UNITY_GAIN_KNOB: f32 = -KNOB_MIN_DB / KNOB_RANGE_DB;

/// Map a normalized knob to dB (`k · 78 - 72`).
#[inline]
pub fn knob_to_db(knob: f32) -> f32 {
    knob * KNOB_RANGE_DB + KNOB_MIN_DB
}

/// Map a normalized knob to a bipolar value in [-1, 1].
#[inline]
pub fn knob_to_bipolar(knob: f32) -> f32 {
    knob * 2.0 - 1.0
}

/// Constant-power left/right gains for `pan` in [-1, 1].
///
/// Out-of-range and non-finite pans are clamped to the nearest valid value
/// (NaN centers).
#[inline]
pub fn constant_power_pan(pan: f32) -> (f32, f32) {
    let pan = if pan.is_finite() { pan.clamp(-1.0, 1.0) } else { 0.0 };
    let angle = (pan + 1.0) * 0.5 * FRAC_PI_2;
    (cosf(angle), sinf(angle))
}
