//! Deterministic noise sources.
//!
//! White noise comes from a xorshift32 generator so every run of the
//! engine is reproducible; pink noise uses Paul Kellet's economy filter.

/// Xorshift32 white noise in [-1, 1].
#[derive(Debug, Clone)]
pub struct WhiteNoise {
    state: u32,
}

impl WhiteNoise {
    /// Seeds the generator. A zero seed is replaced since xorshift would stick at 0.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x1234_5678 } else { seed },
        }
    }

    /// Next sample in [-1, 1].
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x as i32 as f32) / (i32::MAX as f32)
    }
}

impl Default for WhiteNoise {
    fn default() -> Self {
        Self::new(0x1234_5678)
    }
}

/// Pink (-3 dB/octave) noise, Paul Kellet's economy three-pole filter.
///
/// ```text
/// b0 = 0.99765·b0 + w·0.0990460
/// b1 = 0.96300·b1 + w·0.2965164
/// b2 = 0.57000·b2 + w·1.0526913
/// pink = (b0 + b1 + b2 + w·0.1848) · 0.15
/// ```
#[derive(Debug, Clone, Default)]
pub struct PinkNoise {
    white: WhiteNoise,
    b0: f32,
    b1: f32,
    b2: f32,
}

impl PinkNoise {
    /// Output scale keeping the filtered sum roughly within [-1, 1].
    const OUTPUT_SCALE: f32 = 0.15;

    /// Creates a pink source from a white-noise seed.
    pub fn new(seed: u32) -> Self {
        Self {
            white: WhiteNoise::new(seed),
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
        }
    }

    /// Next pink sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let w = self.white.next_sample();
        self.b0 = 0.99765 * self.b0 + w * 0.099_046;
        self.b1 = 0.963 * self.b1 + w * 0.296_516_4;
        self.b2 = 0.57 * self.b2 + w * 1.052_691_3;
        (self.b0 + self.b1 + self.b2 + w * 0.1848) * Self::OUTPUT_SCALE
    }

    /// Clears the filter poles (the generator keeps its sequence position).
    pub fn reset(&mut self) {
        self.b0 = 0.0;
        self.b1 = 0.0;
        self.b2 = 0.0;
    }
}
