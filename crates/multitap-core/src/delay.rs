//! Delay line implementations for the tap engine.
//!
//! Provides circular buffer-based delay lines with fractional reads.
//! Every time-based effect in the engine sits on one of these.
//!
//! # Types
//!
//! - [`InterpolatedDelay`] - Heap-allocated, variable-length delay with interpolation
//! - [`FixedDelayLine`] - Stack-allocated, compile-time fixed length
//!
//! # Read Position
//!
//! A read of `d` samples lands at `write_pos - d`, wrapped into the buffer.
//! `d` is clamped to `[1, capacity - 3]` so the four neighbours needed by
//! Catmull-Rom interpolation (`i-1, i, i+1, i+2`) always exist and never
//! overlap the slot about to be written.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Smallest buffer that can hold a 4-point interpolation window.
pub const MIN_DELAY_CAPACITY: usize = 4;

/// Interpolation method for fractional delay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Linear interpolation between two samples
    Linear,
    /// 4-point Catmull-Rom cubic
    #[default]
    CatmullRom,
}

/// Interpolated delay line using a circular buffer (heap-allocated).
///
/// Out-of-range delay requests are clamped, never rejected, so a read can
/// never fail or index outside the buffer.
///
/// # Memory
///
/// The buffer is allocated once during construction and never reallocates.
///
/// # Example
///
/// ```rust
/// use multitap_core::InterpolatedDelay;
///
/// let mut delay = InterpolatedDelay::new(1024);
/// delay.write(1.0);
/// // One sample after the write the impulse sits exactly one sample back.
/// assert!((delay.read(1.0) - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedDelay {
    /// Circular buffer storage
    buffer: Vec<f32>,
    /// Next slot to be written
    write_pos: usize,
    interpolation: Interpolation,
}

impl InterpolatedDelay {
    /// Creates a new delay line holding `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is below [`MIN_DELAY_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= MIN_DELAY_CAPACITY,
            "delay capacity must be at least {MIN_DELAY_CAPACITY}"
        );

        #[cfg(feature = "tracing")]
        tracing::debug!("delay_alloc: {capacity} samples");

        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            interpolation: Interpolation::CatmullRom,
        }
    }

    /// Creates a delay line able to hold `max_seconds` at `sample_rate`.
    ///
    /// Three guard samples are added so the full `max_seconds` is readable.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        let samples = (sample_rate.max(1.0) * max_seconds.max(0.0)) as usize + 3;
        Self::new(samples.max(MIN_DELAY_CAPACITY))
    }

    /// Sets the interpolation method for fractional reads.
    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    /// Current interpolation method.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Buffer length in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest readable delay in samples (`capacity - 3`).
    #[inline]
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 3) as f32
    }

    /// Index of the slot the next [`write`](Self::write) fills.
    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Stores `sample` at the write index and advances by exactly one slot.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Reads the sample `delay_samples` behind the write index.
    ///
    /// The delay is clamped to `[1, capacity - 3]`; a non-finite request
    /// reads at the minimum delay.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = if delay_samples.is_finite() {
            delay_samples.clamp(1.0, self.max_delay())
        } else {
            1.0
        };

        // Split into whole and fractional parts so long buffers keep
        // sub-sample precision that a single f32 position would lose.
        let whole = delay as usize;
        let delay_frac = delay - whole as f32;
        let (back, frac) = if delay_frac > 0.0 {
            (whole + 1, 1.0 - delay_frac)
        } else {
            (whole, 0.0)
        };

        let i1 = (self.write_pos + len - back) % len;
        let i2 = if i1 + 1 == len { 0 } else { i1 + 1 };

        match self.interpolation {
            Interpolation::Linear => {
                let a = self.buffer[i1];
                let b = self.buffer[i2];
                a + (b - a) * frac
            }
            Interpolation::CatmullRom => {
                let i0 = if i1 == 0 { len - 1 } else { i1 - 1 };
                let i3 = if i2 + 1 == len { 0 } else { i2 + 1 };
                catmull_rom(
                    self.buffer[i0],
                    self.buffer[i1],
                    self.buffer[i2],
                    self.buffer[i3],
                    frac,
                )
            }
        }
    }

    /// Zeroes the buffer and rewinds the write index.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// 4-point Catmull-Rom interpolation between `y1` and `y2`.
///
/// `frac` is the position in `[0, 1)` past `y1`.
#[inline]
pub fn catmull_rom(y0: f32, y1: f32, y2: f32, y3: f32, frac: f32) -> f32 {
    let c0 = y1;
    let c1 = 0.5 * (y2 - y0);
    let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);
    ((c3 * frac + c2) * frac + c1) * frac + c0
}

/// Fixed-length integer delay (stack-allocated).
///
/// `process` returns the input from exactly `N` calls earlier.
#[derive(Debug, Clone)]
pub struct FixedDelayLine<const N: usize> {
    buffer: [f32; N],
    pos: usize,
}

impl<const N: usize> FixedDelayLine<N> {
    /// Creates a silent delay line.
    pub const fn new() -> Self {
        Self {
            buffer: [0.0; N],
            pos: 0,
        }
    }

    /// Delay length in samples.
    pub const fn len(&self) -> usize {
        N
    }

    /// Returns `true` for a zero-length line.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Pushes `input` and returns the sample written `N` calls ago.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if N == 0 {
            return input;
        }
        let out = self.buffer[self.pos];
        self.buffer[self.pos] = input;
        self.pos += 1;
        if self.pos == N {
            self.pos = 0;
        }
        out
    }

    /// Zeroes the line.
    pub fn clear(&mut self) {
        self.buffer = [0.0; N];
        self.pos = 0;
    }
}

impl<const N: usize> Default for FixedDelayLine<N> {
    fn default() -> Self {
        Self::new()
    }
}
