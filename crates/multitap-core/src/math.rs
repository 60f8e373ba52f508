//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] - dB to linear gain
//!
//! # Safety Nets
//!
//! The engine never returns errors from the sample loop. Instead every risky
//! stage runs its output through one of these:
//!
//! | Function | Guards against |
//! |----------|----------------|
//! | [`flush_denormal`] | subnormal slowdown in decaying feedback |
//! | [`finite_or`] | NaN / Inf leaking out of recursive state |
//! | [`soft_clip_knee`] | runaway feedback reaching hard clipping |

use libm::{cosf, expf, sinf, tanhf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use multitap_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Flush values below 1e-20 to zero.
///
/// Use in feedback loops where a signal can decay indefinitely toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Returns `x` when finite, otherwise `fallback`.
#[inline]
pub fn finite_or(x: f32, fallback: f32) -> f32 {
    if x.is_finite() { x } else { fallback }
}

/// Symmetric tanh soft clipper with a linear region below `knee`.
///
/// Values with `|x| <= knee` pass unchanged. Above the knee the excess is
/// compressed by `tanh` so the output approaches `ceiling` asymptotically:
///
/// ```text
/// y = knee + (ceiling - knee) · tanh((|x| - knee) / (ceiling - knee))
/// ```
///
/// The shifter and phaser use `knee = 0.95`, `ceiling = 1.0`.
///
/// # Example
/// ```rust
/// use multitap_core::soft_clip_knee;
///
/// assert_eq!(soft_clip_knee(0.5, 0.95, 1.0), 0.5);
/// assert!(soft_clip_knee(10.0, 0.95, 1.0) <= 1.0);
/// assert!(soft_clip_knee(-10.0, 0.95, 1.0) >= -1.0);
/// ```
#[inline]
pub fn soft_clip_knee(x: f32, knee: f32, ceiling: f32) -> f32 {
    let magnitude = x.abs();
    if magnitude <= knee {
        return x;
    }
    let span = ceiling - knee;
    if span <= 0.0 {
        return knee.copysign(x);
    }
    let shaped = knee + span * tanhf((magnitude - knee) / span);
    shaped.copysign(x)
}

/// Constant-power gains `(cos θ, sin θ)` for a blend angle in radians.
///
/// θ = 0 is fully the first signal, θ = π/2 fully the second.
#[inline]
pub fn equal_power(theta: f32) -> (f32, f32) {
    (cosf(theta), sinf(theta))
}
