//! Gain and constant-power pan stage.

use multitap_core::gain::{KNOB_MAX_DB, KNOB_MIN_DB, constant_power_pan, knob_to_bipolar, knob_to_db};
use multitap_core::{Processor, bipolar, db_to_linear, normalized};

/// Gain added per unit of meta offset, in dB.
pub const GAIN_OFFSET_DB: f32 = 48.0;

/// Logarithmic gain followed by constant-power pan.
///
/// ## Parameters
///
/// | Knob | Mapping | Offset |
/// |------|---------|--------|
/// | p1 | `78·p1 − 72` dB | `o1 · 48` dB |
/// | p2 | `2·p2 − 1` pan | `o2` |
///
/// Totals are clamped to [−72, +6] dB and [−1, 1]. Gain is applied before pan.
///
/// # Example
///
/// ```rust
/// use multitap_effects::AmpPan;
/// use multitap_core::Processor;
///
/// let mut amp = AmpPan::new();
/// amp.set_params(1.0, 0.0, 0.0); // +6 dB, hard left
/// let (mut l, mut r) = (1.0, 1.0);
/// amp.process(&mut l, &mut r, 48000.0);
/// assert!((l - 1.995).abs() < 1e-3);
/// assert!(r.abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct AmpPan {
    gain_db: f32,
    pan: f32,
    offset_db: f32,
    offset_pan: f32,
}

impl Default for AmpPan {
    fn default() -> Self {
        Self::new()
    }
}

impl AmpPan {
    /// Unity gain, centered.
    pub fn new() -> Self {
        Self {
            gain_db: 0.0,
            pan: 0.0,
            offset_db: 0.0,
            offset_pan: 0.0,
        }
    }

    /// Total gain in dB.
    pub fn total_db(&self) -> f32 {
        (self.gain_db + self.offset_db).clamp(KNOB_MIN_DB, KNOB_MAX_DB)
    }

    /// Total pan in [-1, 1].
    pub fn total_pan(&self) -> f32 {
        (self.pan + self.offset_pan).clamp(-1.0, 1.0)
    }

    /// Linear `(left, right)` gains currently applied.
    pub fn channel_gains(&self) -> (f32, f32) {
        let gain = db_to_linear(self.total_db());
        let (pl, pr) = constant_power_pan(self.total_pan());
        (gain * pl, gain * pr)
    }
}

impl Processor for AmpPan {
    fn set_params(&mut self, p1: f32, p2: f32, _p3: f32) {
        self.gain_db = knob_to_db(normalized(p1, 0.0));
        self.pan = knob_to_bipolar(normalized(p2, 0.5));
    }

    fn set_offsets(&mut self, o1: f32, o2: f32) {
        self.offset_db = bipolar(o1) * GAIN_OFFSET_DB;
        self.offset_pan = bipolar(o2);
    }

    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return;
        }
        let (gl, gr) = self.channel_gains();
        *left *= gl;
        *right *= gr;
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_1_SQRT_2;

    #[test]
    fn test_center_pan_is_equal() {
        let mut amp = AmpPan::new();
        amp.set_params(0.7, 0.5, 0.0);
        let (l, r) = amp.channel_gains();
        assert!((l - r).abs() < 1e-6);
    }

    #[test]
    fn test_pan_extremes() {
        let mut amp = AmpPan::new();
        amp.set_params(72.0 / 78.0, 0.0, 0.0);
        let (l, r) = amp.channel_gains();
        assert!((l - 1.0).abs() < 1e-4);
        assert!(r.abs() < 1e-6);

        amp.set_params(72.0 / 78.0, 1.0, 0.0);
        let (l, r) = amp.channel_gains();
        assert!(l.abs() < 1e-6);
        assert!((r - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_half_gain_knob_centered() {
        // 0.5 · 78 − 72 = −33 dB → 10^(−1.65)
        let mut amp = AmpPan::new();
        amp.set_params(0.5, 0.5, 0.0);
        assert!((amp.total_db() + 33.0).abs() < 1e-4);
        let gain = db_to_linear(amp.total_db());
        assert!((gain - 0.022_387).abs() < 1e-5);

        let (mut l, mut r) = (1.0, 1.0);
        amp.process(&mut l, &mut r, 48000.0);
        assert_eq!(l, r);
        assert!((l - gain * FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_offsets_clamp_to_knob_range() {
        let mut amp = AmpPan::new();
        amp.set_params(1.0, 1.0, 0.0);
        amp.set_offsets(1.0, 1.0);
        assert_eq!(amp.total_db(), 6.0);
        assert_eq!(amp.total_pan(), 1.0);

        amp.set_params(0.0, 0.0, 0.0);
        amp.set_offsets(-1.0, -1.0);
        assert_eq!(amp.total_db(), -72.0);
        assert_eq!(amp.total_pan(), -1.0);
    }

    #[test]
    fn test_offset_moves_gain() {
        let mut amp = AmpPan::new();
        amp.set_params(0.5, 0.5, 0.0);
        amp.set_offsets(0.5, 0.0);
        assert!((amp.total_db() + 9.0).abs() < 1e-4);
    }
}
