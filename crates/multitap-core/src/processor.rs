//! The per-tap processor contract.
//!
//! Every stage in a tap's chain (delay, filter, amp/pan, frequency shifter,
//! phaser) implements [`Processor`]. The capability set is intentionally
//! small:
//!
//! - **Normalized parameters**: `set_params` takes knob values in [0, 1];
//!   each processor owns the mapping to its physical units and clamps.
//! - **Meta offsets**: `set_offsets` adds bipolar [-1, 1] offsets from the
//!   meta column before the final clamp. Processors without an offset
//!   mapping keep the default no-op.
//! - **Stereo in place**: `process` rewrites a sample pair. A sample rate
//!   below 1 Hz means "pass through untouched".
//! - **No allocations**: all methods are callable from the audio thread.

/// Stereo, in-place audio processor driven by normalized parameters.
///
/// Given identical internal state and identical inputs, output is
/// deterministic.
///
/// # Example
///
/// ```rust
/// use multitap_core::Processor;
///
/// struct Trim {
///     gain: f32,
/// }
///
/// impl Processor for Trim {
///     fn set_params(&mut self, p1: f32, _p2: f32, _p3: f32) {
///         self.gain = p1.clamp(0.0, 1.0);
///     }
///
///     fn process(&mut self, left: &mut f32, right: &mut f32, _sample_rate: f32) {
///         *left *= self.gain;
///         *right *= self.gain;
///     }
///
///     fn reset(&mut self) {}
/// }
///
/// let mut trim = Trim { gain: 1.0 };
/// trim.set_params(0.5, 0.0, 0.0);
/// let (mut l, mut r) = (1.0, -1.0);
/// trim.process(&mut l, &mut r, 48000.0);
/// assert_eq!((l, r), (0.5, -0.5));
/// ```
pub trait Processor {
    /// Sets the normalized knob values. `p3` is only read by processors that
    /// have a third control.
    fn set_params(&mut self, p1: f32, p2: f32, p3: f32);

    /// Sets bipolar meta offsets in [-1, 1].
    fn set_offsets(&mut self, _o1: f32, _o2: f32) {}

    /// Processes one stereo sample in place.
    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32);

    /// Clears internal audio state (buffers, filter memories).
    fn reset(&mut self);
}

impl<P: Processor + ?Sized> Processor for &mut P {
    fn set_params(&mut self, p1: f32, p2: f32, p3: f32) {
        (**self).set_params(p1, p2, p3);
    }

    fn set_offsets(&mut self, o1: f32, o2: f32) {
        (**self).set_offsets(o1, o2);
    }

    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        (**self).process(left, right, sample_rate);
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Clamps a normalized knob into [0, 1]; NaN becomes `fallback`.
#[inline]
pub fn normalized(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Clamps a meta offset into [-1, 1]; NaN becomes 0.
#[inline]
pub fn bipolar(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_clamps() {
        assert_eq!(normalized(1.5, 0.5), 1.0);
        assert_eq!(normalized(-0.1, 0.5), 0.0);
        assert_eq!(normalized(f32::NAN, 0.5), 0.5);
    }

    #[test]
    fn test_bipolar_clamps() {
        assert_eq!(bipolar(3.0), 1.0);
        assert_eq!(bipolar(-3.0), -1.0);
        assert_eq!(bipolar(f32::INFINITY), 0.0);
    }
}
