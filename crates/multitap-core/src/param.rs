//! Parameter handling with smoothing for zipper-free changes.
//!
//! Control values arrive asynchronously relative to the sample clock, so
//! every parameter that shapes audio is approached gradually:
//!
//! - [`SmoothedParam`] - exponential approach with a time constant in ms
//! - [`SlewedParam`] - exponential approach with a fixed per-sample rate
//!
//! Both follow `current += (target - current) · λ` and therefore move
//! monotonically toward the target without overshoot for `λ ∈ (0, 1]`.
//! Once a step can no longer move the value (or the gap is within one
//! epsilon of the target) the value lands on the target exactly.
//!
//! ## Usage
//!
//! ```rust
//! use multitap_core::SmoothedParam;
//!
//! let mut wet = SmoothedParam::with_config(0.0, 48000.0, 15.0);
//! wet.set_target(1.0);
//! for _ in 0..720 { // one time constant at 48 kHz
//!     wet.advance();
//! }
//! assert!((wet.get() - 0.632).abs() < 0.01);
//! ```

use libm::expf;

/// One exponential step from `current` toward `target`.
///
/// f32 rounding stalls the plain update short of the target once
/// `λ · gap` falls under half an ulp, so a stalled or negligible step
/// finishes on the target.
#[inline]
fn step_toward(current: f32, target: f32, coeff: f32) -> f32 {
    if coeff <= 0.0 {
        return current;
    }
    let next = current + coeff * (target - current);
    let epsilon = f32::EPSILON * target.abs().max(1.0);
    if next == current || (target - next).abs() <= epsilon {
        target
    } else {
        next
    }
}

/// A parameter with exponential smoothing driven by a time constant.
///
/// `λ = 1 - exp(-1 / (τ · sample_rate))` with `τ = smoothing_time_ms / 1000`.
/// After `5τ` the value is within 0.7% of its target.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (1 = instant)
    coeff: f32,
    sample_rate: f32,
    smoothing_time_ms: f32,
    /// Value restored if the state ever becomes non-finite
    fallback: f32,
}

impl SmoothedParam {
    /// Create a parameter with instant response until configured.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            smoothing_time_ms: 0.0,
            fallback: initial,
        }
    }

    /// Create a smoothed parameter with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Set the target value. Non-finite targets are ignored.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target;
        }
    }

    /// Set target and current together (no smoothing).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        if value.is_finite() {
            self.target = value;
            self.current = value;
        }
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set smoothing time in milliseconds (0 = instant).
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Advance one sample and return the new current value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current = step_toward(self.current, self.target, self.coeff);
        if !self.current.is_finite() {
            self.current = self.fallback;
        }
        self.current
    }

    /// Current smoothed value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Per-sample coefficient λ.
    #[inline]
    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    /// Check if the parameter has reached its target (within 1e-6).
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Skip ahead to the target value immediately.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate.is_nan() || self.sample_rate < 1.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Per-sample slew used by the reverb engines.
pub const REVERB_SLEW: f32 = 0.001;

/// A parameter approached at a fixed per-sample rate.
///
/// Independent of sample rate: at `rate = 0.001` the value covers 63% of
/// a step in 1000 samples.
#[derive(Debug, Clone)]
pub struct SlewedParam {
    current: f32,
    target: f32,
    rate: f32,
    fallback: f32,
}

impl SlewedParam {
    /// Create a parameter resting at `initial`.
    pub fn new(initial: f32, rate: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            rate: rate.clamp(0.0, 1.0),
            fallback: initial,
        }
    }

    /// Set the target value. Non-finite targets are ignored.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target;
        }
    }

    /// Advance one sample and return the new current value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current = step_toward(self.current, self.target, self.rate);
        if !self.current.is_finite() {
            self.current = self.fallback;
        }
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Jump to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}
