//! Allpass diffusion reverb.
//!
//! ```text
//!              ┌─► 12 left stages ──► DC block ─┐
//! (L+R)/2 ─► 8 mono stages                        ├─► dry + mix · wet
//!              └─► 12 right stages ─► DC block ─┘
//! ```
//!
//! Every stage is a [`ModulatedAllpass`] whose length is a prime base length
//! scaled by the diffusion and time controls, wobbled by one shared sine LFO
//! read at 32 evenly spaced phase offsets. All stages share the allpass gain
//! derived from gravity.

use core::array;

use multitap_core::{DcBlocker, Lfo, ModulatedAllpass, REVERB_SLEW, SlewedParam, soft_clip_knee};

use super::{ReverbEngine, ReverbParams};

const MONO_STAGES: usize = 8;
const BRANCH_STAGES: usize = 12;
const TOTAL_STAGES: usize = MONO_STAGES + 2 * BRANCH_STAGES;

const MONO_BUFFER: usize = 4000;
const BRANCH_BUFFER: usize = 8000;

const MONO_PRIMES: [f32; MONO_STAGES] = [151.0, 197.0, 251.0, 313.0, 389.0, 443.0, 503.0, 593.0];
const LEFT_PRIMES: [f32; BRANCH_STAGES] = [
    701.0, 821.0, 941.0, 1061.0, 1181.0, 1301.0, 1423.0, 1543.0, 1667.0, 1787.0, 1907.0, 2027.0,
];
const RIGHT_PRIMES: [f32; BRANCH_STAGES] = [
    2141.0, 1279.0, 1151.0, 1031.0, 709.0, 827.0, 947.0, 1063.0, 1187.0, 1303.0, 1427.0, 1549.0,
];

const MONO_MOD_SAMPLES: f32 = 10.0;
const BRANCH_MOD_SAMPLES: f32 = 15.0;
/// Right branch runs slightly longer for decorrelation.
const RIGHT_SCALE: f32 = 1.08;
const MAX_DAMPING: f32 = 0.95;
const WET_KNEE: f32 = 10.0;
const WET_CEILING: f32 = 12.0;

/// Allpass gain for a gravity knob, piecewise linear in three bands.
///
/// | gravity | g |
/// |---------|---|
/// | 0 – 0.4 | 0.1 – 0.5 |
/// | 0.4 – 0.75 | 0.5 – 0.8 |
/// | 0.75 – 1 | 0.8 – 0.995 |
pub(crate) fn gravity_to_gain(gravity: f32) -> f32 {
    let gravity = gravity.clamp(0.0, 1.0);
    if gravity < 0.4 {
        0.1 + gravity / 0.4 * 0.4
    } else if gravity < 0.75 {
        0.5 + (gravity - 0.4) / 0.35 * 0.3
    } else {
        0.8 + (gravity - 0.75) / 0.25 * (0.995 - 0.8)
    }
}

/// 32-stage modulated allpass diffuser.
///
/// Knob mappings are direct: `mod_freq` is the LFO rate in Hz, `time` scales
/// every stage length, `damping` (capped at 0.95) darkens each stage's
/// delayed path. Stage lengths are clamped to their buffers, so long
/// time/diffusion settings saturate rather than wrap.
///
/// # Example
///
/// ```rust
/// use multitap_effects::{DiffusionReverb, ReverbParams};
/// use multitap_effects::reverb::ReverbEngine;
///
/// let mut reverb = DiffusionReverb::new();
/// reverb.set_params(&ReverbParams::default());
/// let (mut l, mut r) = (1.0, 1.0);
/// reverb.process(&mut l, &mut r, 48000.0);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct DiffusionReverb {
    mono: [ModulatedAllpass; MONO_STAGES],
    left: [ModulatedAllpass; BRANCH_STAGES],
    right: [ModulatedAllpass; BRANCH_STAGES],
    dc_left: DcBlocker,
    dc_right: DcBlocker,
    lfo: Lfo,
    gain: SlewedParam,
    diffusion: SlewedParam,
    mix: SlewedParam,
    damping: SlewedParam,
    mod_freq: SlewedParam,
    mod_depth: SlewedParam,
    time: SlewedParam,
}

impl Default for DiffusionReverb {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffusionReverb {
    /// Allocates all 32 stages, parameters resting at their defaults.
    pub fn new() -> Self {
        let p = ReverbParams::default();
        let slewed = |v: f32| SlewedParam::new(v, REVERB_SLEW);
        Self {
            mono: array::from_fn(|_| ModulatedAllpass::new(MONO_BUFFER)),
            left: array::from_fn(|_| ModulatedAllpass::new(BRANCH_BUFFER)),
            right: array::from_fn(|_| ModulatedAllpass::new(BRANCH_BUFFER)),
            dc_left: DcBlocker::default(),
            dc_right: DcBlocker::default(),
            lfo: Lfo::new(),
            gain: slewed(gravity_to_gain(p.gravity)),
            diffusion: slewed(p.diffusion),
            mix: slewed(p.mix),
            damping: slewed(p.damping),
            mod_freq: slewed(p.mod_freq),
            mod_depth: slewed(p.mod_depth),
            time: slewed(p.time),
        }
    }

    /// Target allpass gain.
    pub fn target_gain(&self) -> f32 {
        self.gain.target()
    }

    /// Current (slewed) wet level.
    pub fn current_mix(&self) -> f32 {
        self.mix.get()
    }

    fn stages_mut(&mut self) -> impl Iterator<Item = &mut ModulatedAllpass> {
        self.mono
            .iter_mut()
            .chain(self.left.iter_mut())
            .chain(self.right.iter_mut())
    }

    #[inline]
    fn offset(stage: usize) -> f32 {
        stage as f32 / TOTAL_STAGES as f32
    }
}

impl ReverbEngine for DiffusionReverb {
    fn set_params(&mut self, params: &ReverbParams) {
        let p = params.clamped();
        self.gain.set_target(gravity_to_gain(p.gravity));
        self.diffusion.set_target(p.diffusion);
        self.mix.set_target(p.mix);
        self.damping.set_target(p.damping.min(MAX_DAMPING));
        self.mod_freq.set_target(p.mod_freq);
        self.mod_depth.set_target(p.mod_depth);
        self.time.set_target(p.time);
    }

    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return;
        }
        let (dry_l, dry_r) = (*left, *right);

        let g = self.gain.advance();
        let diffusion = self.diffusion.advance();
        let mix = self.mix.advance();
        let damping = self.damping.advance();
        let mod_freq = self.mod_freq.advance();
        let mod_depth = self.mod_depth.advance();
        let time = self.time.advance();

        for stage in self.stages_mut() {
            stage.set_feedback(g);
            stage.set_damping(damping);
        }

        self.lfo.advance(mod_freq, sample_rate);
        let scale = (0.1 + diffusion * 4.0) * time;

        let mut mono = (dry_l + dry_r) * 0.5;
        for (i, stage) in self.mono.iter_mut().enumerate() {
            let wobble = self.lfo.sine_at(Self::offset(i)) * MONO_MOD_SAMPLES * mod_depth;
            mono = stage.process(mono, MONO_PRIMES[i] * scale + wobble);
        }

        let (mut branch_l, mut branch_r) = (mono, mono);
        let branch_mod = BRANCH_MOD_SAMPLES * mod_depth;
        for i in 0..BRANCH_STAGES {
            let wobble_l = self.lfo.sine_at(Self::offset(MONO_STAGES + i)) * branch_mod;
            branch_l = self.left[i].process(branch_l, LEFT_PRIMES[i] * scale + wobble_l);

            let wobble_r = self.lfo.sine_at(Self::offset(MONO_STAGES + BRANCH_STAGES + i)) * branch_mod;
            branch_r = self.right[i].process(branch_r, RIGHT_PRIMES[i] * scale * RIGHT_SCALE + wobble_r);
        }

        let wet_l = soft_clip_knee(self.dc_left.process(branch_l), WET_KNEE, WET_CEILING);
        let wet_r = soft_clip_knee(self.dc_right.process(branch_r), WET_KNEE, WET_CEILING);
        let out_l = dry_l + mix * wet_l;
        let out_r = dry_r + mix * wet_r;

        if out_l.is_finite() && out_r.is_finite() {
            *left = out_l;
            *right = out_r;
        } else {
            self.reset();
        }
    }

    fn reset(&mut self) {
        for stage in self.stages_mut() {
            stage.clear();
        }
        self.dc_left.reset();
        self.dc_right.reset();
    }
}
