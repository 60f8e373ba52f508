//! Engine configuration validation.
//!
//! Every field of an [`EngineConfig`](crate::EngineConfig) is checked and all
//! failures are collected, so a hand-edited file reports every problem at once.
//!
//! # Example
//!
//! ```rust
//! use multitap_config::{EngineConfig, validate_engine_config};
//!
//! let mut config = EngineConfig::default();
//! assert!(validate_engine_config(&config).is_ok());
//!
//! config.num_taps = 9;
//! assert!(validate_engine_config(&config).is_err());
//! ```

use multitap_effects::HoleControl;
use thiserror::Error;

use crate::EngineConfig;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the field.
        field: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// NaN or infinite value.
    #[error("'{field}' is not a finite number")]
    NotFinite {
        /// Name of the field.
        field: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Smallest legal `max_sample_rate`.
pub const MIN_SAMPLE_RATE: u32 = 8_000;
/// Largest legal `max_sample_rate`.
pub const MAX_SAMPLE_RATE: u32 = 768_000;
/// Longest delay buffer a configuration may ask for, in seconds.
pub const MAX_DELAY_SECONDS: f32 = 60.0;
/// Number of delay taps the engine supports.
pub const MAX_TAPS: usize = 4;

/// Checks one float field against `[min, max]`.
pub fn check_range(field: &str, value: f32, min: f32, max: f32) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Validates a complete engine configuration.
///
/// Returns the single error directly, or [`ValidationError::Multiple`] when
/// more than one field is wrong.
pub fn validate_engine_config(config: &EngineConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();
    let mut push = |result: ValidationResult<()>| {
        if let Err(e) = result {
            errors.push(e);
        }
    };

    push(check_range("max_feedback", config.max_feedback, 0.0, 1.0));
    push(check_range(
        "max_delay_seconds",
        config.max_delay_seconds,
        0.001,
        MAX_DELAY_SECONDS,
    ));
    let meta_max = if config.max_delay_seconds.is_finite() {
        config.max_delay_seconds.clamp(0.0, MAX_DELAY_SECONDS)
    } else {
        MAX_DELAY_SECONDS
    };
    push(check_range("meta_delay_limit", config.meta_delay_limit, 0.0, meta_max));
    push(check_range(
        "max_sample_rate",
        config.max_sample_rate as f32,
        MIN_SAMPLE_RATE as f32,
        MAX_SAMPLE_RATE as f32,
    ));
    push(check_range("num_taps", config.num_taps as f32, 1.0, MAX_TAPS as f32));

    let hole = &config.hole;
    for (field, control, value) in [
        ("hole.delay_time", HoleControl::DelayTime, hole.delay_time),
        ("hole.damping", HoleControl::Damping, hole.damping),
        ("hole.feedback", HoleControl::Feedback, hole.feedback),
        ("hole.mod_depth", HoleControl::ModDepth, hole.mod_depth),
        ("hole.mod_freq", HoleControl::ModFreq, hole.mod_freq),
    ] {
        let (min, max) = control.range();
        push(check_range(field, value, min, max));
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
