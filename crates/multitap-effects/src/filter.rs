//! Base/width band filter stage.

use libm::{expf, logf};
use multitap_core::{BaseWidthFilter, Processor, bipolar, normalized};

/// Lowest base frequency in Hz.
pub const MIN_BASE_HZ: f32 = 20.0;
/// Highest base frequency in Hz.
pub const MAX_BASE_HZ: f32 = 20000.0;
/// Base frequency added per unit of meta offset.
pub const BASE_OFFSET_HZ: f32 = 10000.0;
/// Width added per unit of meta offset.
pub const WIDTH_OFFSET: f32 = 50.0;

/// Stereo band filter: keeps the band from `base` up `width` octaves.
///
/// ## Parameters
///
/// | Knob | Mapping | Offset |
/// |------|---------|--------|
/// | p1 | `20 · 1000^p1` Hz (log) | `o1 · 10000` Hz |
/// | p2 | `100 · p2` | `o2 · 50` |
///
/// Totals are clamped to [20, 20000] Hz and [0, 100].
#[derive(Debug, Clone)]
pub struct BaseWidth {
    left: BaseWidthFilter,
    right: BaseWidthFilter,
    base_hz: f32,
    width: f32,
    offset_base: f32,
    offset_width: f32,
}

impl Default for BaseWidth {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseWidth {
    /// Creates the filter at 1 kHz with width 50.
    pub fn new() -> Self {
        Self {
            left: BaseWidthFilter::new(),
            right: BaseWidthFilter::new(),
            base_hz: 1000.0,
            width: 50.0,
            offset_base: 0.0,
            offset_width: 0.0,
        }
    }

    /// Maps a knob to the base frequency on a log scale.
    pub fn knob_to_hz(knob: f32) -> f32 {
        let lo = logf(MIN_BASE_HZ);
        let hi = logf(MAX_BASE_HZ);
        expf(lo + knob * (hi - lo))
    }

    /// Base frequency after offsets, in Hz.
    pub fn total_base_hz(&self) -> f32 {
        (self.base_hz + self.offset_base).clamp(MIN_BASE_HZ, MAX_BASE_HZ)
    }

    /// Width after offsets, in [0, 100].
    pub fn total_width(&self) -> f32 {
        (self.width + self.offset_width).clamp(0.0, BaseWidthFilter::MAX_WIDTH)
    }
}

impl Processor for BaseWidth {
    fn set_params(&mut self, p1: f32, p2: f32, _p3: f32) {
        self.base_hz = Self::knob_to_hz(normalized(p1, 0.5));
        self.width = normalized(p2, 0.5) * BaseWidthFilter::MAX_WIDTH;
    }

    fn set_offsets(&mut self, o1: f32, o2: f32) {
        self.offset_base = bipolar(o1) * BASE_OFFSET_HZ;
        self.offset_width = bipolar(o2) * WIDTH_OFFSET;
    }

    fn process(&mut self, left: &mut f32, right: &mut f32, sample_rate: f32) {
        if sample_rate.is_nan() || sample_rate < 1.0 {
            return;
        }
        let base = self.total_base_hz();
        let width = self.total_width();
        self.left.set_params(sample_rate, base, width);
        self.right.set_params(sample_rate, base, width);
        *left = self.left.process(*left);
        *right = self.right.process(*right);
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn test_knob_mapping_endpoints() {
        assert!((BaseWidth::knob_to_hz(0.0) - 20.0).abs() < 1e-3);
        assert!((BaseWidth::knob_to_hz(1.0) - 20000.0).abs() < 1.0);
        assert!((BaseWidth::knob_to_hz(0.4337) - 400.0).abs() < 2.0);
    }

    #[test]
    fn test_offsets_clamp() {
        let mut f = BaseWidth::new();
        f.set_params(1.0, 1.0, 0.0);
        f.set_offsets(1.0, 1.0);
        assert_eq!(f.total_base_hz(), MAX_BASE_HZ);
        assert_eq!(f.total_width(), 100.0);
        f.set_offsets(-1.0, -1.0);
        assert!((f.total_base_hz() - 10000.0).abs() < 1.0);
        assert_eq!(f.total_width(), 50.0);
    }

    #[test]
    fn test_stereo_channels_are_independent() {
        let mut f = BaseWidth::new();
        f.set_params(0.3, 0.3, 0.0);
        for i in 0..500 {
            let (mut l, mut r) = ((i as f32 * 0.1).sin(), 0.0);
            f.process(&mut l, &mut r, 48000.0);
            assert_eq!(r, 0.0);
        }
    }

    #[test]
    fn test_band_passes_inside_rejects_below() {
        let sr = 48000.0;
        let measure = |freq: f32| {
            let mut f = BaseWidth::new();
            // 400 Hz base, five octaves up to 12.8 kHz
            f.set_params(0.4337, 0.5, 0.0);
            let mut sum = 0.0;
            for n in 0..9600 {
                let x = (2.0 * PI * freq * n as f32 / sr).sin();
                let (mut l, mut r) = (x, x);
                f.process(&mut l, &mut r, sr);
                if n >= 4800 {
                    sum += l * l;
                }
            }
            (sum / 4800.0).sqrt()
        };
        let inside = measure(2000.0);
        let below = measure(20.0);
        assert!(inside > 0.5, "inside band rms {inside}");
        assert!(below < 0.1, "below band rms {below}");
    }
}
