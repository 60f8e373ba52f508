//! "Hole" reverb: a generated stereo DSP graph behind a thin wrapper.
//!
//! The graph itself is addressed the way code-generated DSP usually is:
//! an `init(sample_rate)` that rebuilds state, named controls, and a block
//! `compute` over channel slices. [`HoleReverb`] adapts any such graph to the
//! per-sample [`ReverbEngine`] contract and owns the knob mapping.
//!
//! The built-in [`HoleGraph`]:
//!
//! ```text
//!  in_L ─►(+)─► delay ─► damp ─► 4× diffuser ─┬─► out_L
//!          ▲                                   │
//!          └──── feedback ◄─── out_R           │
//!  in_R ─►(+)─► delay ─► damp ─► 4× diffuser ─┼─► out_R
//!          ▲                                   │
//!          └──── feedback ◄─── out_L ◄─────────┘
//! ```
//!
//! Each channel's loop is fed from the other channel's output, so energy
//! circulates across the stereo field.

use core::array;

use multitap_core::{InterpolatedDelay, Interpolation, Lfo, ModulatedAllpass, OnePole, REVERB_SLEW, SlewedParam};

use super::{ReverbEngine, ReverbParams};

/// Named controls of a generated graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoleControl {
    /// Loop damping in [0, 0.99].
    Damping,
    /// Cross feedback in [0, 0.99].
    Feedback,
    /// Modulation rate in [0, 10] Hz.
    ModFreq,
    /// Modulation depth in [0, 1].
    ModDepth,
    /// Main delay in [0.001, 1.45] s.
    DelayTime,
    /// Diffuser coefficient in [0, 0.99].
    Diffusion,
    /// Diffuser length multiplier in [0.5, 3].
    Size,
}

impl HoleControl {
    /// Every control.
    pub const ALL: [HoleControl; 7] = [
        HoleControl::Damping,
        HoleControl::Feedback,
        HoleControl::ModFreq,
        HoleControl::ModDepth,
        HoleControl::DelayTime,
        HoleControl::Diffusion,
        HoleControl::Size,
    ];

    /// Legal `(min, max)` for this control.
    pub fn range(self) -> (f32, f32) {
        match self {
            HoleControl::Damping | HoleControl::Feedback | HoleControl::Diffusion => (0.0, 0.99),
            HoleControl::ModFreq => (0.0, 10.0),
            HoleControl::ModDepth => (0.0, 1.0),
            HoleControl::DelayTime => (0.001, 1.45),
            HoleControl::Size => (0.5, 3.0),
        }
    }

    /// Clamps a value into range; non-finite values land on the minimum.
    pub fn clamp(self, value: f32) -> f32 {
        let (lo, hi) = self.range();
        if value.is_finite() { value.clamp(lo, hi) } else { lo }
    }
}

/// Code-generated stereo DSP: initialise, set controls, compute blocks.
pub trait GeneratedDsp {
    /// Rebuilds all state for a sample rate.
    fn init(&mut self, sample_rate: u32);

    /// Sets a named control. Implementations clamp to [`HoleControl::range`].
    fn set_control(&mut self, control: HoleControl, value: f32);

    /// Current value of a control.
    fn control(&self, control: HoleControl) -> f32;

    /// Processes `min(len)` frames from two input slices into two outputs.
    fn compute(&mut self, inputs: [&[f32]; 2], outputs: [&mut [f32]; 2]);
}

/// Fixed part of the hole reverb's voicing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleTuning {
    /// Main loop delay in seconds.
    pub delay_time: f32,
    /// Loop damping.
    pub damping: f32,
    /// Cross feedback.
    pub feedback: f32,
    /// Modulation depth.
    pub mod_depth: f32,
    /// Modulation rate in Hz.
    pub mod_freq: f32,
}

impl Default for HoleTuning {
    fn default() -> Self {
        Self {
            delay_time: 0.2,
            damping: 0.135,
            feedback: 0.3,
            mod_depth: 0.1,
            mod_freq: 2.0,
        }
    }
}

const REFERENCE_RATE: f32 = 48000.0;
const DIFFUSERS: usize = 4;
const DIFFUSER_PRIMES_L: [f32; DIFFUSERS] = [113.0, 211.0, 379.0, 563.0];
const DIFFUSER_PRIMES_R: [f32; DIFFUSERS] = [127.0, 227.0, 397.0, 587.0];
/// Diffuser wobble at full depth, in samples at the reference rate.
const DIFFUSER_MOD: f32 = 16.0;
/// Main delay wobble at full depth, in samples at the reference rate.
const MAIN_MOD: f32 = 32.0;
const MAX_SIZE: f32 = 3.0;
const MAX_DELAY_TIME: f32 = 1.45;

/// One side of the loop.
#[derive(Debug, Clone)]
struct HoleChannel {
    delay: InterpolatedDelay,
    damping: OnePole,
    diffusers: [ModulatedAllpass; DIFFUSERS],
    last_out: f32,
}

impl HoleChannel {
    fn new(max_sample_rate: f32) -> Self {
        let scale = max_sample_rate / REFERENCE_RATE;
        let main = (MAX_DELAY_TIME * max_sample_rate + MAIN_MOD * scale) as usize + 8;
        let diffuser = ((DIFFUSER_PRIMES_R[DIFFUSERS - 1] * MAX_SIZE + DIFFUSER_MOD) * scale) as usize + 8;
        let mut delay = InterpolatedDelay::new(main);
        delay.set_interpolation(Interpolation::Linear);
        Self {
            delay,
            damping: OnePole::new(1.0),
            diffusers: array::from_fn(|_| ModulatedAllpass::new(diffuser)),
            last_out: 0.0,
        }
    }

    fn clear(&mut self) {
        self.delay.clear();
        self.damping.reset();
        for d in &mut self.diffusers {
            d.clear();
        }
        self.last_out = 0.0;
    }
}

/// The built-in generated graph: cross-fed modulated delay loop with
/// damping and four modulated diffusers per channel.
///
/// Buffers are sized at construction for `max_sample_rate`; `init` at a
/// higher rate still works but long delays clamp to the buffer.
#[derive(Debug, Clone)]
pub struct HoleGraph {
    left: HoleChannel,
    right: HoleChannel,
    lfo: Lfo,
    sample_rate: f32,
    damping: f32,
    feedback: f32,
    mod_freq: f32,
    mod_depth: f32,
    diffusion: f32,
    delay_time: SlewedParam,
    size: SlewedParam,
}

impl HoleGraph {
    /// Allocates every buffer for rates up to `max_sample_rate`.
    pub fn new(max_sample_rate: f32) -> Self {
        let max_sample_rate = if max_sample_rate.is_finite() {
            max_sample_rate.max(REFERENCE_RATE)
        } else {
            REFERENCE_RATE
        };
        let tuning = HoleTuning::default();
        let mut graph = Self {
            left: HoleChannel::new(max_sample_rate),
            right: HoleChannel::new(max_sample_rate),
            lfo: Lfo::new(),
            sample_rate: REFERENCE_RATE,
            damping: tuning.damping,
            feedback: tuning.feedback,
            mod_freq: tuning.mod_freq,
            mod_depth: tuning.mod_depth,
            diffusion: 0.5,
            delay_time: SlewedParam::new(tuning.delay_time, REVERB_SLEW),
            size: SlewedParam::new(1.0, REVERB_SLEW),
        };
        graph.set_control(HoleControl::Damping, tuning.damping);
        graph.init(REFERENCE_RATE as u32);
        graph
    }

    /// Sample rate set by the last `init`.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    fn tick(&mut self, in_l: f32, in_r: f32) -> (f32, f32) {
        let sr = self.sample_rate;
        let scale = sr / REFERENCE_RATE;
        let delay_time = self.delay_time.advance();
        let size = self.size.advance();
        self.lfo.advance(self.mod_freq, sr);

        let main_mod = MAIN_MOD * scale * self.mod_depth;
        let base = delay_time * sr;
        let delayed_l = self.left.delay.read(base + self.lfo.sine() * main_mod);
        let delayed_r = self.right.delay.read(base + self.lfo.sine_at(0.25) * main_mod);
        self.left.delay.write(in_l + self.feedback * self.right.last_out);
        self.right.delay.write(in_r + self.feedback * self.left.last_out);

        let mut l = self.left.damping.process(delayed_l);
        let mut r = self.right.damping.process(delayed_r);

        let diff_mod = DIFFUSER_MOD * scale * self.mod_depth;
        for i in 0..DIFFUSERS {
            let offset = i as f32 / (2 * DIFFUSERS) as f32;
            let len_l = DIFFUSER_PRIMES_L[i] * size * scale + self.lfo.sine_at(offset) * diff_mod;
            let len_r = DIFFUSER_PRIMES_R[i] * size * scale + self.lfo.sine_at(offset + 0.5) * diff_mod;
            l = self.left.diffusers[i].process(l, len_l);
            r = self.right.diffusers[i].process(r, len_r);
        }

        self.left.last_out = l;
        self.right.last_out = r;
        (l, r)
    }
}

impl GeneratedDsp for HoleGraph {
    fn init(&mut self, sample_rate: u32) {
        self.sample_rate = (sample_rate as f32).max(1.0);
        self.left.clear();
        self.right.clear();
        self.lfo.reset();
        self.delay_time.snap_to_target();
        self.size.snap_to_target();
    }

    fn set_control(&mut self, control: HoleControl, value: f32) {
        let value = control.clamp(value);
        match control {
            HoleControl::Damping => {
                self.damping = value;
                self.left.damping.set_coefficient(1.0 - value);
                self.right.damping.set_coefficient(1.0 - value);
            }
            HoleControl::Feedback => self.feedback = value,
            HoleControl::ModFreq => self.mod_freq = value,
            HoleControl::ModDepth => self.mod_depth = value,
            HoleControl::DelayTime => self.delay_time.set_target(value),
            HoleControl::Diffusion => {
                self.diffusion = value;
                for d in self.left.diffusers.iter_mut().chain(self.right.diffusers.iter_mut()) {
                    d.set_feedback(value);
                }
            }
            HoleControl::Size => self.size.set_target(value),
        }
    }

    fn control(&self, control: HoleControl) -> f32 {
        match control {
            HoleControl::Damping => self.damping,
            HoleControl::Feedback => self.feedback,
            HoleControl::ModFreq => self.mod_freq,
            HoleControl::ModDepth => self.mod_depth,
            HoleControl::DelayTime => self.delay_time.target(),
            HoleControl::Diffusion => self.diffusion,
            HoleControl::Size => self.size.target(),
        }
    }

    fn compute(&mut self, inputs: [&[f32]; 2], outputs: [&mut [f32]; 2]) {
        let [in_l, in_r] = inputs;
        let [out_l, out_r] = outputs;
        let frames = in_l.len().min(in_r.len()).min(out_l.len()).min(out_r.len());
        for n in 0..frames {
            let (l, r) = self.tick(in_l[n], in_r[n]);
            out_l[n] = l;
            out_r[n] = r;
        }
    }
}

/// Size control for a normalized knob: `0.5 + 2.5·knob`.
pub fn knob_to_size(knob: f32) -> f32 {
    0.5 + 2.5 * knob.clamp(0.0, 1.0)
}

/// Diffusion control for a normalized knob: `0.1 + 0.9·knob`.
pub fn knob_to_diffusion(knob: f32) -> f32 {
    0.1 + 0.9 * knob.clamp(0.0, 1.0)
}

/// Per-sample wrapper around a [`GeneratedDsp`].
///
/// Reads `mix`, `gravity` (size) and `diffusion` from [`ReverbParams`]; the
/// rest of the voicing comes from [`HoleTuning`]. The output is a crossfade,
/// `in + (wet − in)·mix`, so full mix is fully wet.
///
/// # Example
///
/// ```rust
/// use multitap_effects::{HoleGraph, HoleReverb, HoleTuning};
/// use multitap_effects::reverb::ReverbEngine;
///
/// let mut hole = HoleReverb::new(HoleGraph::new(48000.0), HoleTuning::default());
/// hole.set_knobs(0.0, 0.5, 0.5);
/// let (mut l, mut r) = (0.3, -0.3);
/// hole.process(&mut l, &mut r, 48000.0);
/// assert_eq!((l, r), (0.3, -0.3));
/// ```
#[derive(Debug, Clone)]
pub struct HoleReverb<D: GeneratedDsp = HoleGraph> {
    dsp: D,
    tuning: HoleTuning,
    mix: f32,
    size: f32,
    diffusion: f32,
    last_sample_rate: f32,
}

impl<D: GeneratedDsp> HoleReverb<D> {
    /// Wraps a graph and applies the tuning.
    pub fn new(dsp: D, tuning: HoleTuning) -> Self {
        let mut reverb = Self {
            dsp,
            tuning,
            mix: 0.3,
            size: knob_to_size(0.5),
            diffusion: knob_to_diffusion(0.5),
            last_sample_rate: 0.0,
        };
        reverb.push_controls();
        reverb
    }

    /// Sets mix and the size/diffusion knobs (all normalized).
    pub fn set_knobs(&mut self, mix: f32, size_knob: f32, diffusion_knob: f32) {
        self.mix = if mix.is_finite() { mix.clamp(0.0, 1.0) } else { 0.0 };
        self.size = knob_to_size(if size_knob.is_finite() { size_knob } else { 0.5 });
        self.diffusion = knob_to_diffusion(if diffusion_knob.is_finite() { diffusion_knob } else { 0.5 });
        self.push_controls();
    }

    /// Replaces the fixed voicing.
    pub fn set_tuning(&mut self, tuning: HoleTuning) {
        self.tuning = tuning;
        self.push_controls();
    }

    /// Current voicing.
    pub fn tuning(&self) -> HoleTuning {
        self.tuning
    }

    /// Wrapped graph.
    pub fn dsp(&self) -> &D {
        &self.dsp
    }

    fn push_controls(&mut self) {
        let t = self.tuning;
        for (control, value) in [
            (HoleControl::Damping, t.damping),
            (HoleControl::Feedback, t.feedback),
            (HoleControl::ModFreq, t.mod_freq),
            (HoleControl::ModDepth, t.mod_depth),
            (HoleControl::DelayTime, t.delay_time),
            (HoleControl::Diffusion, self.diffusion),
            (HoleControl::Size, self.size),
        ] {
            self.dsp.set_control(control, value);
        }
    }

    fn reinit(&mut self, sample_rate: f32) {
        self.dsp.init(sample_rate as u32);
        self.push_controls();
        self.last_sample_rate = sample_rate;
    }
}

impl<D: GeneratedDsp> ReverbEngine for HoleReverb<D> {
    fn set_params(&mut self, params: &ReverbParams) {
        self.set_knobs(params.mix, params.gravity, params.diffusion);
    }

    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return;
        }
        if (sample_rate - self.last_sample_rate).abs() > 1.0 {
            self.reinit(sample_rate);
        }

        let (dry_l, dry_r) = (*left, *right);
        let mut wet_l = [0.0f32];
        let mut wet_r = [0.0f32];
        self.dsp.compute([&[dry_l], &[dry_r]], [&mut wet_l, &mut wet_r]);

        let out_l = dry_l + (wet_l[0] - dry_l) * self.mix;
        let out_r = dry_r + (wet_r[0] - dry_r) * self.mix;
        if out_l.is_finite() && out_r.is_finite() {
            *left = out_l;
            *right = out_r;
        } else {
            *left = if out_l.is_finite() { out_l } else { 0.0 };
            *right = if out_r.is_finite() { out_r } else { 0.0 };
            let sr = self.last_sample_rate;
            self.reinit(sr);
        }
    }

    fn reset(&mut self) {
        if self.last_sample_rate >= 1.0 {
            let sr = self.last_sample_rate;
            self.reinit(sr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Doubles its input and records how it was driven.
    #[derive(Default)]
    struct Doubler {
        inits: Vec<u32>,
        controls: [f32; 7],
    }

    impl GeneratedDsp for Doubler {
        fn init(&mut self, sample_rate: u32) {
            self.inits.push(sample_rate);
            self.controls = [0.0; 7];
        }

        fn set_control(&mut self, control: HoleControl, value: f32) {
            let i = HoleControl::ALL.iter().position(|c| *c == control).unwrap_or(0);
            self.controls[i] = control.clamp(value);
        }

        fn control(&self, control: HoleControl) -> f32 {
            let i = HoleControl::ALL.iter().position(|c| *c == control).unwrap_or(0);
            self.controls[i]
        }

        fn compute(&mut self, inputs: [&[f32]; 2], outputs: [&mut [f32]; 2]) {
            let [in_l, in_r] = inputs;
            let [out_l, out_r] = outputs;
            out_l[0] = 2.0 * in_l[0];
            out_r[0] = 2.0 * in_r[0];
        }
    }

    #[test]
    fn test_knob_mappings() {
        assert_eq!(knob_to_size(0.0), 0.5);
        assert_eq!(knob_to_size(1.0), 3.0);
        assert!((knob_to_diffusion(0.0) - 0.1).abs() < 1e-6);
        assert!((knob_to_diffusion(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mix_crossfades_toward_wet() {
        let mut hole = HoleReverb::new(Doubler::default(), HoleTuning::default());
        hole.set_knobs(0.5, 0.5, 0.5);
        let (mut l, mut r) = (0.2, -0.4);
        hole.process(&mut l, &mut r, 48000.0);
        assert!((l - 0.3).abs() < 1e-6);
        assert!((r + 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_reinit_only_on_rate_change() {
        let mut hole = HoleReverb::new(Doubler::default(), HoleTuning::default());
        for sr in [48000.0, 48000.5, 48000.0, 44100.0] {
            let (mut l, mut r) = (0.0, 0.0);
            hole.process(&mut l, &mut r, sr);
        }
        assert_eq!(hole.dsp().inits, vec![48000, 44100]);
        // Controls survive a re-init.
        assert!((hole.dsp().control(HoleControl::Feedback) - 0.3).abs() < 1e-6);
        assert!((hole.dsp().control(HoleControl::DelayTime) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_tuning_is_clamped_by_graph() {
        let mut graph = HoleGraph::new(48000.0);
        graph.set_control(HoleControl::Feedback, 5.0);
        graph.set_control(HoleControl::DelayTime, 0.0);
        graph.set_control(HoleControl::Size, f32::NAN);
        assert_eq!(graph.control(HoleControl::Feedback), 0.99);
        assert_eq!(graph.control(HoleControl::DelayTime), 0.001);
        assert_eq!(graph.control(HoleControl::Size), 0.5);
    }

    #[test]
    fn test_graph_produces_decaying_tail() {
        let mut hole = HoleReverb::new(HoleGraph::new(48000.0), HoleTuning::default());
        hole.set_knobs(1.0, 0.5, 0.5);
        let mut early = 0.0f32;
        let mut late = 0.0f32;
        for i in 0..(48000 * 4) {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let (mut l, mut r) = (x, x);
            hole.process(&mut l, &mut r, 48000.0);
            assert!(l.is_finite() && r.is_finite());
            if (9000..20_000).contains(&i) {
                early = early.max(l.abs());
            }
            if i > 48000 * 3 {
                late = late.max(l.abs());
            }
        }
        assert!(early > 1e-3, "no reverb: {early}");
        assert!(late < 1e-3, "tail did not decay: {late}");
    }

    #[test]
    fn test_graph_sized_for_max_rate() {
        let mut hole = HoleReverb::new(HoleGraph::new(192_000.0), HoleTuning::default());
        hole.set_knobs(1.0, 1.0, 1.0);
        for i in 0..192_000 {
            let x = if i % 4800 == 0 { 0.8 } else { 0.0 };
            let (mut l, mut r) = (x, -x);
            hole.process(&mut l, &mut r, 192_000.0);
            assert!(l.abs() < 10.0 && r.abs() < 10.0);
        }
        assert_eq!(hole.dsp().sample_rate(), 192_000.0);
    }
}
