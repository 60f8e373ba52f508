//! Platform-specific configuration and state paths.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/multitap/` (Linux), `~/Library/Application Support/multitap/` (macOS), `%APPDATA%\multitap\` (Windows)
//! - **Saved state**: `~/.local/share/multitap/` (Linux), `~/Library/Application Support/multitap/` (macOS), `%APPDATA%\multitap\` (Windows)
//!
//! # Example
//!
//! ```rust,no_run
//! use multitap_config::{EngineConfig, paths};
//!
//! let config = if paths::engine_config_path().exists() {
//!     EngineConfig::load(paths::engine_config_path()).unwrap()
//! } else {
//!     EngineConfig::default()
//! };
//! println!("{} taps", config.num_taps);
//! ```

use std::path::PathBuf;

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "multitap";

/// File name of the engine configuration.
const ENGINE_CONFIG_FILE: &str = "engine.toml";

/// File name of the saved host state.
const STATE_FILE: &str = "state.json";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the engine configuration file inside [`user_config_dir`].
pub fn engine_config_path() -> PathBuf {
    user_config_dir().join(ENGINE_CONFIG_FILE)
}

/// Directory holding saved host state.
///
/// Falls back to [`user_config_dir`] when the platform has no data directory.
pub fn state_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(user_config_dir)
}

/// Path of the default state file inside [`state_dir`].
pub fn state_path() -> PathBuf {
    state_dir().join(STATE_FILE)
}

/// Creates the user config directory if it does not exist.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
        tracing::info!(path = %dir.display(), "created config directory");
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_end_in_app_dir() {
        assert!(user_config_dir().ends_with(APP_NAME));
        assert!(state_dir().ends_with(APP_NAME));
    }

    #[test]
    fn test_files_live_in_their_dirs() {
        assert_eq!(engine_config_path().parent(), Some(user_config_dir().as_path()));
        assert_eq!(state_path().file_name().and_then(|n| n.to_str()), Some(STATE_FILE));
    }
}
