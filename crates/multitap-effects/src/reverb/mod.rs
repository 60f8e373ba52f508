//! Reverb engines and the bank that switches between them.
//!
//! Three algorithms share one parameter block ([`ReverbParams`]):
//!
//! - [`DiffusionReverb`] - 32 modulated allpass stages, mono then stereo
//! - [`FdnReverb`] - 4- and 8-line orthogonal feedback delay networks
//! - [`HoleReverb`] - a generated stereo DSP graph behind [`GeneratedDsp`]
//!
//! [`ReverbBank`] owns all three. Only the active engine receives the input;
//! the others are fed silence so their tails keep decaying without being
//! heard, and switching back never replays a frozen tail.

mod diffusion;
mod fdn;
mod hole;

pub use diffusion::DiffusionReverb;
pub use fdn::{FdnReverb, decay_to_t60};
pub use hole::{GeneratedDsp, HoleControl, HoleGraph, HoleReverb, HoleTuning};

/// Reverb algorithm selector. Indices are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ReverbKind {
    /// Allpass diffusion network.
    #[default]
    Diffusion = 0,
    /// Feedback delay network.
    Fdn = 1,
    /// Generated "hole" graph.
    Hole = 2,
}

impl ReverbKind {
    /// All kinds in index order.
    pub const ALL: [ReverbKind; 3] = [ReverbKind::Diffusion, ReverbKind::Fdn, ReverbKind::Hole];

    /// Stable index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Kind for a stable index, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            ReverbKind::Diffusion => "Diffusion",
            ReverbKind::Fdn => "FDN",
            ReverbKind::Hole => "Hole",
        }
    }
}

/// Normalized reverb controls, all in [0, 1].
///
/// Each engine reads the subset it understands:
///
/// | Field | Diffusion | FDN | Hole |
/// |-------|-----------|-----|------|
/// | `mix` | wet level | wet level | dry/wet |
/// | `gravity` | allpass gain | decay (T60) | size |
/// | `diffusion` | delay scale | 4/8-line density | diffusion |
/// | `damping` | delayed-path lowpass | - | - |
/// | `mod_freq` | LFO rate (Hz) | - | - |
/// | `mod_depth` | LFO depth | - | - |
/// | `time` | delay-time multiplier | - | - |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    /// Wet amount.
    pub mix: f32,
    /// Decay control.
    pub gravity: f32,
    /// Density / diffusion control.
    pub diffusion: f32,
    /// High-frequency damping.
    pub damping: f32,
    /// Modulation rate.
    pub mod_freq: f32,
    /// Modulation depth.
    pub mod_depth: f32,
    /// Delay-time scale.
    pub time: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            mix: 0.3,
            gravity: 0.5,
            diffusion: 0.5,
            damping: 0.2,
            mod_freq: 0.5,
            mod_depth: 0.5,
            time: 0.5,
        }
    }
}

impl ReverbParams {
    /// Copy with every field clamped into [0, 1]; non-finite fields take
    /// their default.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        let c = |v: f32, fallback: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { fallback };
        Self {
            mix: c(self.mix, d.mix),
            gravity: c(self.gravity, d.gravity),
            diffusion: c(self.diffusion, d.diffusion),
            damping: c(self.damping, d.damping),
            mod_freq: c(self.mod_freq, d.mod_freq),
            mod_depth: c(self.mod_depth, d.mod_depth),
            time: c(self.time, d.time),
        }
    }
}

/// Common surface of the three reverb engines.
pub trait ReverbEngine {
    /// Sets the parameter targets; engines slew toward them.
    fn set_params(&mut self, params: &ReverbParams);

    /// Processes one stereo sample in place. Rates below 1 Hz pass through.
    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32);

    /// Clears all delay memory.
    fn reset(&mut self);
}

/// All three engines with a selector.
///
/// # Example
///
/// ```rust
/// use multitap_effects::{ReverbBank, ReverbKind, ReverbParams, HoleTuning};
///
/// let mut bank = ReverbBank::new(48000.0, HoleTuning::default());
/// bank.set_params(&ReverbParams { mix: 0.0, ..ReverbParams::default() });
/// bank.set_kind(ReverbKind::Fdn);
/// let (mut l, mut r) = (0.5, 0.5);
/// bank.process(&mut l, &mut r, 48000.0);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct ReverbBank {
    diffusion: DiffusionReverb,
    fdn: FdnReverb,
    hole: HoleReverb,
    kind: ReverbKind,
    params: ReverbParams,
}

impl ReverbBank {
    /// Builds all engines, sizing the hole graph for `max_sample_rate`.
    pub fn new(max_sample_rate: f32, tuning: HoleTuning) -> Self {
        let params = ReverbParams::default();
        let mut bank = Self {
            diffusion: DiffusionReverb::new(),
            fdn: FdnReverb::new(),
            hole: HoleReverb::new(HoleGraph::new(max_sample_rate), tuning),
            kind: ReverbKind::default(),
            params,
        };
        bank.set_params(&params);
        bank
    }

    /// Active engine.
    pub fn kind(&self) -> ReverbKind {
        self.kind
    }

    /// Selects the engine that is heard. No state moves between engines.
    pub fn set_kind(&mut self, kind: ReverbKind) {
        self.kind = kind;
    }

    /// Current parameter targets.
    pub fn params(&self) -> ReverbParams {
        self.params
    }

    /// Sends the (clamped) targets to every engine so a switch is seamless.
    pub fn set_params(&mut self, params: &ReverbParams) {
        self.params = params.clamped();
        for kind in ReverbKind::ALL {
            let p = self.params;
            self.engine_mut(kind).set_params(&p);
        }
    }

    /// Replaces the hole graph's fixed tuning.
    pub fn set_hole_tuning(&mut self, tuning: HoleTuning) {
        self.hole.set_tuning(tuning);
    }

    /// The engine behind a selector.
    pub fn engine_mut(&mut self, kind: ReverbKind) -> &mut dyn ReverbEngine {
        match kind {
            ReverbKind::Diffusion => &mut self.diffusion,
            ReverbKind::Fdn => &mut self.fdn,
            ReverbKind::Hole => &mut self.hole,
        }
    }

    /// Runs every engine for one sample; only the active one hears the input
    /// and only its output is returned.
    #[inline]
    pub fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return;
        }
        let active = self.kind;
        for kind in ReverbKind::ALL {
            if kind == active {
                self.engine_mut(kind).process(left, right, sample_rate);
            } else {
                let (mut sl, mut sr) = (0.0, 0.0);
                self.engine_mut(kind).process(&mut sl, &mut sr, sample_rate);
            }
        }
    }

    /// Clears every engine.
    pub fn reset(&mut self) {
        for kind in ReverbKind::ALL {
            self.engine_mut(kind).reset();
        }
    }
}
