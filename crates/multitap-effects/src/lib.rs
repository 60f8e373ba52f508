//! Multitap Effects - per-tap processors and reverb engines
//!
//! Each tap of the multitap delay runs a fixed chain of processors, every
//! one driven by normalized knobs through [`multitap_core::Processor`]:
//!
//! - [`TapDelay`] - Private stereo delay line with feedback
//! - [`BaseWidth`] - Band-reject "hole" filter set by base frequency and width
//! - [`AmpPan`] - Logarithmic gain and constant-power pan
//! - [`FrequencyShifter`] - Hilbert single-sideband shifter
//! - [`Phaser`] - Swept allpass cascade with pink-noise injection
//!
//! [`Tap`] wires them together; [`Mode`] addresses a processor slot.
//!
//! The summed taps feed a [`ReverbBank`] holding three engines:
//!
//! - [`DiffusionReverb`] - 32 modulated allpass stages
//! - [`FdnReverb`] - 4- and 8-line feedback delay networks
//! - [`HoleReverb`] - Cross-fed modulated loop behind [`GeneratedDsp`]
//!
//! ## Example
//!
//! ```rust
//! use multitap_effects::{DelayLimits, Mode, ReverbBank, Tap, HoleTuning};
//!
//! let mut tap = Tap::new(DelayLimits::default());
//! tap.set_params(Mode::Delay, 0.05, 0.4, 0.0);
//!
//! let mut reverb = ReverbBank::new(48000.0, HoleTuning::default());
//! let (mut l, mut r) = tap.process(0.5, 0.5, 48000.0);
//! reverb.process(&mut l, &mut r, 48000.0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod amp_pan;
pub mod delay;
pub mod filter;
pub mod frequency_shifter;
pub mod phaser;
pub mod reverb;
pub mod tap;

pub use amp_pan::AmpPan;
pub use delay::{DelayLimits, MIN_DELAY_SECONDS, TapDelay};
pub use filter::BaseWidth;
pub use frequency_shifter::FrequencyShifter;
pub use phaser::Phaser;
pub use reverb::{
    DiffusionReverb, FdnReverb, GeneratedDsp, HoleControl, HoleGraph, HoleReverb, HoleTuning,
    ReverbBank, ReverbEngine, ReverbKind, ReverbParams,
};
pub use tap::{Mode, Tap};
