//! Host-owned state round-tripped through the engine as JSON.
//!
//! The knob table is flat, indexed `[column][mode][knob]`:
//!
//! ```text
//! index = column · 10 + mode · 2 + knob
//! ```
//!
//! Columns 0..=3 are the taps and column 4 is the meta column. Every field
//! carries a serde default, so a document written by an older host (for
//! example one holding only the `state` array) still loads.

use std::path::Path;

use multitap_effects::{Mode, ReverbKind, ReverbParams};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tap columns plus the meta column.
pub const COLUMNS: usize = 5;
/// Index of the meta column.
pub const META_COLUMN: usize = 4;
/// Stored knobs per mode.
pub const KNOBS_PER_MODE: usize = 2;
/// Length of the flat knob table.
pub const KNOB_COUNT: usize = COLUMNS * Mode::COUNT * KNOBS_PER_MODE;
/// Input gain knob for 0 dB (`78·k − 72 = 0`).
pub const DEFAULT_INPUT_GAIN: f32 = 0.923076;

/// Flat index of one stored knob.
pub fn knob_index(column: usize, mode: Mode, knob: usize) -> usize {
    column * Mode::COUNT * KNOBS_PER_MODE + mode.index() * KNOBS_PER_MODE + knob
}

/// Power-on value of a stored knob.
///
/// Taps start at a 0.5 s delay without feedback, unity gain centred, a
/// 400 Hz filter of width 50, and both modulation effects off. Meta knobs
/// start at 0.5, a zero offset.
pub fn default_knob(column: usize, mode: Mode, knob: usize) -> f32 {
    if column == META_COLUMN {
        return 0.5;
    }
    match (mode, knob) {
        // (0.5 − 0.001) / 9.999
        (Mode::Delay, 0) => 0.049905,
        (Mode::AmpPan, 0) => DEFAULT_INPUT_GAIN,
        (Mode::AmpPan, _) => 0.5,
        // ln(400/20) / ln(20000/20)
        (Mode::Filter, 0) => 0.433677,
        (Mode::Filter, _) => 0.5,
        // Signed wet of zero.
        (Mode::Fx1, 1) => 0.5,
        _ => 0.0,
    }
}

fn default_knobs() -> Vec<f32> {
    (0..KNOB_COUNT)
        .map(|i| {
            let column = i / (Mode::COUNT * KNOBS_PER_MODE);
            let mode = Mode::from_index((i / KNOBS_PER_MODE) % Mode::COUNT).unwrap_or_default();
            default_knob(column, mode, i % KNOBS_PER_MODE)
        })
        .collect()
}

/// Reverb targets as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbSection {
    /// Wet amount.
    pub mix: f32,
    /// Decay control.
    pub gravity: f32,
    /// Density / diffusion control.
    pub diffusion: f32,
    /// High-frequency damping.
    pub damping: f32,
    /// Modulation rate.
    pub mod_freq: f32,
    /// Modulation depth.
    pub mod_depth: f32,
    /// Delay-time scale.
    pub time: f32,
}

impl Default for ReverbSection {
    fn default() -> Self {
        ReverbParams::default().into()
    }
}

impl From<ReverbParams> for ReverbSection {
    fn from(p: ReverbParams) -> Self {
        Self {
            mix: p.mix,
            gravity: p.gravity,
            diffusion: p.diffusion,
            damping: p.damping,
            mod_freq: p.mod_freq,
            mod_depth: p.mod_depth,
            time: p.time,
        }
    }
}

impl From<ReverbSection> for ReverbParams {
    fn from(s: ReverbSection) -> Self {
        Self {
            mix: s.mix,
            gravity: s.gravity,
            diffusion: s.diffusion,
            damping: s.damping,
            mod_freq: s.mod_freq,
            mod_depth: s.mod_depth,
            time: s.time,
        }
    }
}

/// Everything a host saves and restores.
///
/// # Example
///
/// ```rust
/// use multitap_config::PersistedState;
///
/// // A legacy document with nothing but the knob table.
/// let state = PersistedState::from_json(r#"{ "state": [0.1, 0.2] }"#).unwrap();
/// assert_eq!(state.knobs.len(), multitap_config::KNOB_COUNT);
/// assert_eq!(state.knobs[0], 0.1);
/// assert_eq!(state.reverb_mode, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    /// Flat `[column][mode][knob]` table of normalized values.
    #[serde(alias = "state")]
    pub knobs: Vec<f32>,
    /// Selected mode index per column.
    pub selected_modes: [usize; COLUMNS],
    /// Input gain knob.
    pub input_gain: f32,
    /// Reverb targets.
    pub reverb: ReverbSection,
    /// Pink noise fed into every phaser.
    pub phaser_noise_gain: f32,
    /// Active reverb engine index.
    pub reverb_mode: usize,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            knobs: default_knobs(),
            selected_modes: [0; COLUMNS],
            input_gain: DEFAULT_INPUT_GAIN,
            reverb: ReverbSection::default(),
            phaser_noise_gain: 0.0,
            reverb_mode: 0,
        }
    }
}

impl PersistedState {
    /// Parses a state document and sanitizes it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut state: Self = serde_json::from_str(json)?;
        state.sanitize();
        Ok(state)
    }

    /// Serializes the state to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads and sanitizes a state file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_json(&content)
    }

    /// Writes the state as JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_json()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Stored knob, or its default when the table is short.
    pub fn knob(&self, column: usize, mode: Mode, knob: usize) -> f32 {
        self.knobs
            .get(knob_index(column, mode, knob))
            .copied()
            .unwrap_or_else(|| default_knob(column, mode, knob))
    }

    /// Selected mode of a column.
    pub fn selected_mode(&self, column: usize) -> Mode {
        self.selected_modes
            .get(column)
            .and_then(|&i| Mode::from_index(i))
            .unwrap_or_default()
    }

    /// Active reverb engine.
    pub fn reverb_kind(&self) -> ReverbKind {
        ReverbKind::from_index(self.reverb_mode).unwrap_or_default()
    }

    /// Forces every value into its legal range. Returns `true` when anything
    /// had to change.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;

        if self.knobs.len() != KNOB_COUNT {
            let defaults = default_knobs();
            let len = self.knobs.len();
            self.knobs.truncate(KNOB_COUNT);
            let kept = self.knobs.len();
            self.knobs.extend_from_slice(&defaults[kept..]);
            tracing::warn!(len, expected = KNOB_COUNT, "knob table resized");
            changed = true;
        }

        for (i, value) in self.knobs.iter_mut().enumerate() {
            let column = i / (Mode::COUNT * KNOBS_PER_MODE);
            let mode = Mode::from_index((i / KNOBS_PER_MODE) % Mode::COUNT).unwrap_or_default();
            changed |= sanitize_unit(value, default_knob(column, mode, i % KNOBS_PER_MODE));
        }

        for mode in &mut self.selected_modes {
            if *mode >= Mode::COUNT {
                *mode = 0;
                changed = true;
            }
        }

        changed |= sanitize_unit(&mut self.input_gain, DEFAULT_INPUT_GAIN);
        changed |= sanitize_unit(&mut self.phaser_noise_gain, 0.0);

        let reverb: ReverbParams = self.reverb.into();
        let clamped = reverb.clamped();
        if clamped != reverb {
            self.reverb = clamped.into();
            changed = true;
        }

        if ReverbKind::from_index(self.reverb_mode).is_none() {
            self.reverb_mode = 0;
            changed = true;
        }

        if changed {
            tracing::warn!("persisted state contained out-of-range values; sanitized");
        }
        changed
    }
}

/// Clamps into [0, 1]; non-finite values take `fallback`.
fn sanitize_unit(value: &mut f32, fallback: f32) -> bool {
    let fixed = if value.is_finite() { value.clamp(0.0, 1.0) } else { fallback };
    let changed = fixed.to_bits() != value.to_bits();
    *value = fixed;
    changed
}
