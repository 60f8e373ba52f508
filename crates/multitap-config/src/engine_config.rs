//! Immutable process-wide engine configuration.

use std::path::Path;

use multitap_effects::{DelayLimits, HoleTuning};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_engine_config};

/// Fixed voicing of the hole reverb as stored in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleSection {
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

impl Default for HoleSection {
    fn default() -> Self {
        HoleTuning::default().into()
    }
}

impl From<HoleTuning> for HoleSection {
    fn from(t: HoleTuning) -> Self {
        Self {
            delay_time: t.delay_time,
            damping: t.damping,
            feedback: t.feedback,
            mod_depth: t.mod_depth,
            mod_freq: t.mod_freq,
        }
    }
}

impl From<HoleSection> for HoleTuning {
    fn from(s: HoleSection) -> Self {
        Self {
            delay_time: s.delay_time,
            damping: s.damping,
            feedback: s.feedback,
            mod_depth: s.mod_depth,
            mod_freq: s.mod_freq,
        }
    }
}

/// Tunable constants fixed at engine construction.
///
/// # Example
///
/// ```rust
/// use multitap_config::EngineConfig;
///
/// let config = EngineConfig::from_toml(r#"
///     max_delay_seconds = 4.0
///     meta_delay_limit = 2.0
///     num_taps = 2
///
///     [hole]
///     feedback = 0.5
/// "#).unwrap();
///
/// assert_eq!(config.num_taps, 2);
/// assert_eq!(config.max_feedback, 1.0);
/// assert_eq!(config.hole_tuning().feedback, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Feedback reached at full knob.
    pub max_feedback: f32,
    /// Seconds of delay added per unit of meta offset.
    pub meta_delay_limit: f32,
    /// Longest delay in seconds; sizes every tap buffer.
    pub max_delay_seconds: f32,
    /// Highest sample rate the buffers must cover.
    pub max_sample_rate: u32,
    /// Active delay taps (1 to 4).
    pub num_taps: usize,
    /// Hole reverb voicing.
    pub hole: HoleSection,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let limits = DelayLimits::default();
        Self {
            max_feedback: limits.max_feedback,
            meta_delay_limit: limits.meta_delay_limit,
            max_delay_seconds: limits.max_delay_seconds,
            max_sample_rate: limits.max_sample_rate as u32,
            num_taps: 4,
            hole: HoleSection::default(),
        }
    }
}

impl EngineConfig {
    /// Loads and validates a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Parses and validates a config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the config as TOML, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serializes the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every field; see [`validate_engine_config`].
    pub fn validate(&self) -> ValidationResult<()> {
        validate_engine_config(self)
    }

    /// Delay limits handed to each tap.
    pub fn limits(&self) -> DelayLimits {
        DelayLimits {
            max_feedback: self.max_feedback,
            meta_delay_limit: self.meta_delay_limit,
            max_delay_seconds: self.max_delay_seconds,
            max_sample_rate: self.max_sample_rate as f32,
        }
    }

    /// Hole reverb voicing.
    pub fn hole_tuning(&self) -> HoleTuning {
        self.hole.into()
    }
}
