//! One delay voice and its processor chain.
//!
//! Each tap owns a private stereo delay line and an explicit feedback loop:
//!
//! ```text
//!            ┌──────────────────── feedback ◄───────────────────┐
//!            ▼                                                  │
//! input ─► (+) ─► delay ─► filter ─► amp/pan ─► shifter ─► phaser ─┴─► out
//! ```
//!
//! The chain order is fixed. Feedback re-enters at the delay write after
//! traversing the whole chain.

use multitap_core::Processor;

use crate::{AmpPan, BaseWidth, DelayLimits, FrequencyShifter, Phaser, TapDelay};

/// Processor slot addressed by the host. Indices are persisted, keep them stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Mode {
    /// Delay time and feedback.
    #[default]
    Delay = 0,
    /// Gain and pan.
    AmpPan = 1,
    /// Base frequency and width.
    Filter = 2,
    /// Frequency shifter.
    Fx1 = 3,
    /// Phaser.
    Fx2 = 4,
}

impl Mode {
    /// Number of modes.
    pub const COUNT: usize = 5;

    /// All modes in index order.
    pub const ALL: [Mode; Self::COUNT] = [Mode::Delay, Mode::AmpPan, Mode::Filter, Mode::Fx1, Mode::Fx2];

    /// Stable index of this mode.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Mode for a stable index, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Delay => "Delay",
            Mode::AmpPan => "Amp/Pan",
            Mode::Filter => "Filter",
            Mode::Fx1 => "Freq Shift",
            Mode::Fx2 => "Phaser",
        }
    }
}

/// A delay voice: private delay line plus filter, amp/pan, shifter and phaser.
///
/// # Example
///
/// ```rust
/// use multitap_effects::{DelayLimits, Mode, Tap};
///
/// let mut tap = Tap::new(DelayLimits {
///     max_delay_seconds: 1.0,
///     max_sample_rate: 48000.0,
///     ..DelayLimits::default()
/// });
/// tap.set_params(Mode::Delay, 0.0, 0.0, 0.0);
/// let (l, r) = tap.process(1.0, 1.0, 48000.0);
/// // Nothing has come out of the delay yet.
/// assert_eq!((l, r), (0.0, 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct Tap {
    delay: TapDelay,
    filter: BaseWidth,
    amp_pan: AmpPan,
    shifter: FrequencyShifter,
    phaser: Phaser,
}

impl Tap {
    /// Builds a tap, allocating its delay line for the given limits.
    pub fn new(limits: DelayLimits) -> Self {
        Self {
            delay: TapDelay::new(limits),
            filter: BaseWidth::new(),
            amp_pan: AmpPan::new(),
            shifter: FrequencyShifter::new(),
            phaser: Phaser::new(),
        }
    }

    /// The processor behind a mode slot.
    pub fn processor_mut(&mut self, mode: Mode) -> &mut dyn Processor {
        match mode {
            Mode::Delay => &mut self.delay,
            Mode::AmpPan => &mut self.amp_pan,
            Mode::Filter => &mut self.filter,
            Mode::Fx1 => &mut self.shifter,
            Mode::Fx2 => &mut self.phaser,
        }
    }

    /// Sets the normalized knobs of one processor.
    pub fn set_params(&mut self, mode: Mode, p1: f32, p2: f32, p3: f32) {
        self.processor_mut(mode).set_params(p1, p2, p3);
    }

    /// Sets the meta offsets of one processor.
    pub fn set_offsets(&mut self, mode: Mode, o1: f32, o2: f32) {
        self.processor_mut(mode).set_offsets(o1, o2);
    }

    /// Delay stage.
    pub fn delay(&self) -> &TapDelay {
        &self.delay
    }

    /// Amp/pan stage.
    pub fn amp_pan(&self) -> &AmpPan {
        &self.amp_pan
    }

    /// Filter stage.
    pub fn filter(&self) -> &BaseWidth {
        &self.filter
    }

    /// Frequency shifter stage.
    pub fn shifter(&self) -> &FrequencyShifter {
        &self.shifter
    }

    /// Phaser stage.
    pub fn phaser(&self) -> &Phaser {
        &self.phaser
    }

    /// Mutable phaser stage (stage count).
    pub fn phaser_mut(&mut self) -> &mut Phaser {
        &mut self.phaser
    }

    /// Runs one sample through the chain and feeds it back into the delay.
    ///
    /// A sample rate below 1 Hz passes the input through without touching
    /// any state.
    #[inline]
    pub fn process(&mut self, input_l: f32, input_r: f32, sample_rate: f32) -> (f32, f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return (input_l, input_r);
        }

        let (mut l, mut r) = self.delay.read(sample_rate);
        self.filter.process(&mut l, &mut r, sample_rate);
        self.amp_pan.process(&mut l, &mut r, sample_rate);
        self.shifter.process(&mut l, &mut r, sample_rate);
        self.phaser.process(&mut l, &mut r, sample_rate);

        if !l.is_finite() {
            l = 0.0;
        }
        if !r.is_finite() {
            r = 0.0;
        }

        let fb = self.delay.feedback();
        self.delay.write(input_l + fb * l, input_r + fb * r);
        (l, r)
    }

    /// Clears every processor's audio state.
    pub fn reset(&mut self) {
        for mode in Mode::ALL {
            self.processor_mut(mode).reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;
    /// 10 ms on the delay knob.
    const TEN_MS: f32 = 0.009 / 9.999;

    fn small_tap() -> Tap {
        let mut tap = Tap::new(DelayLimits {
            max_delay_seconds: 1.0,
            max_sample_rate: SR,
            ..DelayLimits::default()
        });
        // Unity gain, wide-open filter so the chain is close to transparent.
        tap.set_params(Mode::AmpPan, 72.0 / 78.0, 0.0, 0.0);
        tap.set_params(Mode::Filter, 0.0, 1.0, 0.0);
        tap.set_params(Mode::Fx1, 0.0, 0.5, 0.0);
        tap.set_params(Mode::Fx2, 0.5, 0.0, 0.0);
        tap
    }

    fn impulse_response(tap: &mut Tap, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let x = if i == 0 { 1.0 } else { 0.0 };
                tap.process(x, 0.0, SR).0
            })
            .collect()
    }

    fn energy(samples: &[f32]) -> f32 {
        samples.iter().map(|v| v * v).sum()
    }

    #[test]
    fn test_mode_indices_are_stable() {
        for (i, mode) in Mode::ALL.iter().enumerate() {
            assert_eq!(mode.index(), i);
            assert_eq!(Mode::from_index(i), Some(*mode));
        }
        assert_eq!(Mode::from_index(5), None);
    }

    #[test]
    fn test_invalid_sample_rate_passes_input() {
        let mut tap = small_tap();
        assert_eq!(tap.process(0.4, -0.2, 0.0), (0.4, -0.2));
        assert_eq!(tap.process(0.4, -0.2, f32::NAN), (0.4, -0.2));
    }

    #[test]
    fn test_feedback_produces_repeats() {
        let mut tap = small_tap();
        tap.set_params(Mode::Delay, TEN_MS, 0.5, 0.0);
        let out = impulse_response(&mut tap, 1500);
        let first = energy(&out[400..700]);
        let second = energy(&out[900..1200]);
        assert!(first > 0.5, "first repeat energy {first}");
        assert!(second > 0.05 && second < first, "second repeat energy {second}");
    }

    #[test]
    fn test_no_feedback_single_repeat() {
        let mut tap = small_tap();
        tap.set_params(Mode::Delay, TEN_MS, 0.0, 0.0);
        let out = impulse_response(&mut tap, 1500);
        assert!(energy(&out[400..700]) > 0.5);
        let late = energy(&out[1000..]);
        assert!(late < 5e-3, "late energy {late}");
    }

    #[test]
    fn test_set_offsets_reach_processor() {
        let mut tap = small_tap();
        tap.set_offsets(Mode::AmpPan, -1.0, 0.0);
        assert!((tap.amp_pan().total_db() + 48.0).abs() < 1e-3);
        tap.set_params(Mode::Delay, TEN_MS, 0.0, 0.0);
        tap.set_offsets(Mode::Delay, 0.1, 0.0);
        assert!((tap.delay().delay_seconds() - (0.010 + 0.5)).abs() < 1e-4);
    }
}
