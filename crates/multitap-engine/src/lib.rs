//! Four-tap stereo delay with meta modulation and a selectable reverb.
//!
//! [`MultitapEngine`] owns four independent [`Tap`](multitap_effects::Tap)s
//! (delay, filter, amp/pan, frequency shifter, phaser, feedback), a fifth
//! "meta" column whose knobs offset the same processor on every tap, an
//! input gain macro and a [`ReverbBank`](multitap_effects::ReverbBank) on the
//! averaged tap sum.
//!
//! A host drives it in one of two ways:
//!
//! - directly, from the thread that also calls [`MultitapEngine::process`];
//! - through a [`SharedParams`] store written by a control thread and pulled
//!   by the audio thread once per block with [`MultitapEngine::apply_shared`].
//!
//! # Example
//!
//! ```rust
//! use multitap_config::{EngineConfig, PersistedState};
//! use multitap_effects::{Mode, ReverbKind};
//! use multitap_engine::MultitapEngine;
//!
//! let mut engine = MultitapEngine::new(EngineConfig {
//!     max_delay_seconds: 2.0,
//!     meta_delay_limit: 1.0,
//!     ..EngineConfig::default()
//! });
//! engine.set_knobs(0, Mode::Delay, 0.02, 0.5);
//! engine.set_reverb_kind(ReverbKind::Fdn);
//!
//! let left = vec![0.25; 256];
//! let mut out_l = vec![0.0; 256];
//! let mut out_r = vec![0.0; 256];
//! engine.process_block(&left, None, &mut out_l, &mut out_r, 48000.0);
//!
//! let saved: PersistedState = engine.snapshot();
//! assert_eq!(saved.reverb_kind(), ReverbKind::Fdn);
//! ```

mod engine;
mod params;

pub use engine::MultitapEngine;
pub use params::SharedParams;
