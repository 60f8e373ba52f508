//! Per-tap stereo delay with feedback.
//!
//! Each tap owns its own pair of delay lines. The tap reads first, runs the
//! rest of its chain on the delayed signal, then writes the fresh input plus
//! the scaled chain output back into the lines (see [`crate::Tap`]).

use multitap_core::{InterpolatedDelay, Interpolation, Processor, bipolar, normalized};

/// Shortest delay a tap can be set to, in seconds.
pub const MIN_DELAY_SECONDS: f32 = 0.001;

/// Knob span of the delay time in seconds (`0.001 + 9.999·p1`).
pub const KNOB_DELAY_SPAN: f32 = 9.999;

/// Immutable limits shared by every tap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayLimits {
    /// Feedback reached at full knob (and the clamp on the total).
    pub max_feedback: f32,
    /// Seconds added per unit of meta offset.
    pub meta_delay_limit: f32,
    /// Longest delay in seconds; sizes the buffers.
    pub max_delay_seconds: f32,
    /// Highest sample rate the buffers must cover.
    pub max_sample_rate: f32,
}

impl Default for DelayLimits {
    fn default() -> Self {
        Self {
            max_feedback: 1.0,
            meta_delay_limit: 5.0,
            max_delay_seconds: 10.0,
            max_sample_rate: 192_000.0,
        }
    }
}

/// Stereo delay stage of a tap.
///
/// ## Parameters
///
/// | Knob | Mapping | Offset |
/// |------|---------|--------|
/// | p1 | `0.001 + 9.999·p1` s | `o1 · meta_delay_limit` s |
/// | p2 | `p2 · max_feedback` | `o2` |
///
/// Totals are clamped to `[0.001, max_delay_seconds]` and `[0, max_feedback]`.
///
/// # Example
///
/// ```rust
/// use multitap_effects::{DelayLimits, TapDelay};
/// use multitap_core::Processor;
///
/// let mut delay = TapDelay::new(DelayLimits {
///     max_delay_seconds: 1.0,
///     max_sample_rate: 48000.0,
///     ..DelayLimits::default()
/// });
/// delay.set_params(0.0, 0.0, 0.0); // 1 ms, no feedback
/// assert!((delay.delay_seconds() - 0.001).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct TapDelay {
    left: InterpolatedDelay,
    right: InterpolatedDelay,
    limits: DelayLimits,
    time: f32,
    feedback: f32,
    offset_time: f32,
    offset_feedback: f32,
}

impl TapDelay {
    /// Allocates both lines for `max_delay_seconds` at `max_sample_rate`.
    pub fn new(limits: DelayLimits) -> Self {
        let mut left = InterpolatedDelay::from_time(limits.max_sample_rate, limits.max_delay_seconds);
        left.set_interpolation(Interpolation::CatmullRom);
        let right = left.clone();
        Self {
            left,
            right,
            limits,
            time: MIN_DELAY_SECONDS + KNOB_DELAY_SPAN * 0.5,
            feedback: 0.0,
            offset_time: 0.0,
            offset_feedback: 0.0,
        }
    }

    /// Limits this delay was built with.
    pub fn limits(&self) -> DelayLimits {
        self.limits
    }

    /// Total delay time in seconds after offsets and clamping.
    pub fn delay_seconds(&self) -> f32 {
        (self.time + self.offset_time).clamp(MIN_DELAY_SECONDS, self.limits.max_delay_seconds)
    }

    /// Total feedback gain after offsets and clamping.
    pub fn feedback(&self) -> f32 {
        (self.feedback + self.offset_feedback).clamp(0.0, self.limits.max_feedback)
    }

    /// Reads the delayed pair. Returns silence for a sample rate below 1 Hz.
    #[inline]
    pub fn read(&self, sample_rate: f32) -> (f32, f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return (0.0, 0.0);
        }
        let samples = self.delay_seconds() * sample_rate;
        (self.left.read(samples), self.right.read(samples))
    }

    /// Writes one pair and advances both lines by one sample.
    #[inline]
    pub fn write(&mut self, left: f32, right: f32) {
        self.left.write(left);
        self.right.write(right);
    }
}

impl Processor for TapDelay {
    fn set_params(&mut self, p1: f32, p2: f32, _p3: f32) {
        self.time = MIN_DELAY_SECONDS + KNOB_DELAY_SPAN * normalized(p1, 0.5);
        self.feedback = normalized(p2, 0.0) * self.limits.max_feedback;
    }

    fn set_offsets(&mut self, o1: f32, o2: f32) {
        self.offset_time = bipolar(o1) * self.limits.meta_delay_limit;
        self.offset_feedback = bipolar(o2);
    }

    /// Self-contained delay: writes `input + feedback · delayed` and outputs
    /// the delayed pair.
    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return;
        }
        let (dl, dr) = self.read(sample_rate);
        let fb = self.feedback();
        self.write(*left + dl * fb, *right + dr * fb);
        *left = dl;
        *right = dr;
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}
