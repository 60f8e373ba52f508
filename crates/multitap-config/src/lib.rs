//! Configuration and persisted state for the multitap delay.
//!
//! Two documents live here:
//!
//! - [`EngineConfig`]: the process-wide constants (feedback ceiling, buffer
//!   length, meta delay range, tap count, hole reverb voicing). TOML, read
//!   once before the engine is built, validated on load.
//! - [`PersistedState`]: the host's knob table, mode selections and reverb
//!   targets. JSON, round-tripped through the engine. Older documents load
//!   with defaults for missing fields and are sanitized rather than rejected.
//!
//! # Example
//!
//! ```rust,no_run
//! use multitap_config::{EngineConfig, PersistedState, paths};
//!
//! let config = EngineConfig::load(paths::engine_config_path()).unwrap_or_default();
//! let state = PersistedState::load(paths::state_path()).unwrap_or_default();
//! println!("{} taps, reverb {:?}", config.num_taps, state.reverb_kind());
//! ```

mod engine_config;
mod error;
mod state;

/// Platform-specific paths for configuration and state.
pub mod paths;

/// Engine configuration validation.
pub mod validation;

pub use engine_config::{EngineConfig, HoleSection};
pub use error::ConfigError;
pub use paths::{engine_config_path, ensure_user_config_dir, state_dir, state_path, user_config_dir};
pub use state::{
    COLUMNS, DEFAULT_INPUT_GAIN, KNOB_COUNT, KNOBS_PER_MODE, META_COLUMN, PersistedState,
    ReverbSection, default_knob, knob_index,
};
pub use validation::{ValidationError, ValidationResult, check_range, validate_engine_config};
