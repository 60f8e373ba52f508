//! Multitap Core - DSP primitives for the multitap delay engine
//!
//! This crate provides the building blocks the per-tap processors and the
//! reverb engines are made of, designed for real-time audio with zero
//! allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Processor Contract
//!
//! - [`Processor`] - Stereo in-place processor driven by normalized knobs
//!
//! ## Parameter Smoothing
//!
//! - [`SmoothedParam`] - Exponential smoothing with a time constant
//! - [`SlewedParam`] - Exponential smoothing at a fixed per-sample rate
//!
//! ## Delay Lines
//!
//! - [`InterpolatedDelay`] - Circular buffer with Catmull-Rom or linear reads
//! - [`FixedDelayLine`] - Fixed-length delay (compile-time size)
//!
//! ## Filters
//!
//! - [`StateVariableFilter`] - Simper trapezoidal SVF (low, band, high)
//! - [`BaseWidthFilter`] - Band defined by a base frequency and an octave width
//! - [`Biquad`] - Second-order IIR with RBJ cookbook coefficients
//! - [`OnePole`] - 6 dB/oct lowpass
//! - [`DcBlocker`] - First-order DC blocking highpass
//! - [`ModulatedAllpass`] - Allpass with a per-sample fractional delay
//! - [`FirHilbert`] / [`HilbertPair`] - 90° phase splitter
//!
//! ## Modulation & Noise
//!
//! - [`Lfo`] - Sine phase accumulator with offset reads
//! - [`PinkNoise`] - Paul Kellet pink noise over a xorshift source
//!
//! ## Utilities
//!
//! - [`matrix`] - Orthogonal `exp(S)` feedback matrices
//! - [`gain`] - Knob-to-dB law and constant-power pan
//! - Math functions: [`db_to_linear`], [`soft_clip_knee`], [`flush_denormal`], etc.
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! multitap-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths
//! - **Unconditionally stable**: Recursive state that turns non-finite is
//!   reset, never propagated
//! - **No dependencies on std**: Pure `no_std` with `libm` for math

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod biquad;
pub mod dc_blocker;
pub mod delay;
pub mod gain;
pub mod hilbert;
pub mod lfo;
pub mod math;
pub mod matrix;
pub mod noise;
pub mod one_pole;
pub mod param;
pub mod processor;
pub mod svf;

// Re-export main types at crate root
pub use allpass::ModulatedAllpass;
pub use biquad::{Biquad, BiquadCoefficients, highpass_coefficients};
pub use dc_blocker::DcBlocker;
pub use delay::{FixedDelayLine, InterpolatedDelay, Interpolation, MIN_DELAY_CAPACITY, catmull_rom};
pub use hilbert::{
    FirHilbert, HILBERT_DELAY, HILBERT_TAPS, HilbertPair, HilbertWindow, MatchingDelay,
};
pub use lfo::Lfo;
pub use math::{db_to_linear, equal_power, finite_or, flush_denormal, soft_clip_knee};
pub use noise::{PinkNoise, WhiteNoise};
pub use one_pole::OnePole;
pub use param::{REVERB_SLEW, SlewedParam, SmoothedParam};
pub use processor::{Processor, bipolar, normalized};
pub use svf::{BaseWidthFilter, StateVariableFilter, SvfOutputs};
