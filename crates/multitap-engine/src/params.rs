//! Lock-free parameter handoff between a control thread and the audio thread.
//!
//! Values are stored as `f32` bit patterns in `AtomicU32`. The control side
//! writes individual fields and bumps a generation counter; the audio side
//! compares the counter once per block and only re-reads when it moved.
//! Individual fields are independent: a block may see some fields of a
//! multi-field update and the rest on the next block, which is harmless for
//! knob values that are smoothed downstream anyway.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use multitap_config::{COLUMNS, KNOBS_PER_MODE, PersistedState, knob_index};
use multitap_effects::{Mode, ReverbKind, ReverbParams};

const REVERB_FIELDS: usize = 7;

struct SharedData {
    knobs: Vec<AtomicU32>,
    selected_modes: [AtomicU32; COLUMNS],
    input_gain: AtomicU32,
    phaser_noise_gain: AtomicU32,
    reverb: [AtomicU32; REVERB_FIELDS],
    reverb_kind: AtomicU32,
    generation: AtomicU64,
}

fn atomic_f32(value: f32) -> AtomicU32 {
    AtomicU32::new(value.to_bits())
}

fn load_f32(atomic: &AtomicU32) -> f32 {
    f32::from_bits(atomic.load(Ordering::Relaxed))
}

fn store_f32(atomic: &AtomicU32, value: f32) {
    atomic.store(value.to_bits(), Ordering::Relaxed);
}

fn reverb_fields(p: &ReverbParams) -> [f32; REVERB_FIELDS] {
    [p.mix, p.gravity, p.diffusion, p.damping, p.mod_freq, p.mod_depth, p.time]
}

/// Parameter store shared by a control thread and the audio thread.
///
/// Cloning is cheap; every clone refers to the same storage.
///
/// # Example
///
/// ```rust
/// use multitap_engine::{MultitapEngine, SharedParams};
/// use multitap_config::EngineConfig;
/// use multitap_effects::Mode;
///
/// let shared = SharedParams::default();
/// let mut engine = MultitapEngine::new(EngineConfig::default());
///
/// // Control thread
/// shared.set_knob(0, Mode::Delay, 0, 0.1);
///
/// // Audio thread, once per block
/// assert!(engine.apply_shared(&shared));
/// assert!(!engine.apply_shared(&shared));
/// assert_eq!(engine.knobs(0, Mode::Delay)[0], 0.1);
/// ```
#[derive(Clone)]
pub struct SharedParams {
    inner: Arc<SharedData>,
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::from_state(&PersistedState::default())
    }
}

impl std::fmt::Debug for SharedParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedParams")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl SharedParams {
    /// Seeds the store from a persisted state.
    pub fn from_state(state: &PersistedState) -> Self {
        let mut state = state.clone();
        state.sanitize();
        let reverb = reverb_fields(&state.reverb.into());
        Self {
            inner: Arc::new(SharedData {
                knobs: state.knobs.iter().map(|&k| atomic_f32(k)).collect(),
                selected_modes: std::array::from_fn(|c| AtomicU32::new(state.selected_modes[c] as u32)),
                input_gain: atomic_f32(state.input_gain),
                phaser_noise_gain: atomic_f32(state.phaser_noise_gain),
                reverb: std::array::from_fn(|i| atomic_f32(reverb[i])),
                reverb_kind: AtomicU32::new(state.reverb_mode as u32),
                generation: AtomicU64::new(1),
            }),
        }
    }

    fn bump(&self) {
        self.inner.generation.fetch_add(1, Ordering::Release);
    }

    /// Change counter; moves on every write.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Stores one knob. Out-of-range columns and knobs are ignored.
    pub fn set_knob(&self, column: usize, mode: Mode, knob: usize, value: f32) {
        if column >= COLUMNS || knob >= KNOBS_PER_MODE {
            return;
        }
        store_f32(&self.inner.knobs[knob_index(column, mode, knob)], value);
        self.bump();
    }

    /// Stored knob.
    pub fn knob(&self, column: usize, mode: Mode, knob: usize) -> f32 {
        self.inner
            .knobs
            .get(knob_index(column, mode, knob))
            .map_or(0.0, load_f32)
    }

    /// Selects the mode shown on a column.
    pub fn select_mode(&self, column: usize, mode: Mode) {
        if let Some(slot) = self.inner.selected_modes.get(column) {
            slot.store(mode.index() as u32, Ordering::Relaxed);
            self.bump();
        }
    }

    /// Input gain knob.
    pub fn set_input_gain(&self, knob: f32) {
        store_f32(&self.inner.input_gain, knob);
        self.bump();
    }

    /// Phaser noise macro.
    pub fn set_phaser_noise_gain(&self, gain: f32) {
        store_f32(&self.inner.phaser_noise_gain, gain);
        self.bump();
    }

    /// Reverb targets.
    pub fn set_reverb_params(&self, params: &ReverbParams) {
        for (slot, value) in self.inner.reverb.iter().zip(reverb_fields(params)) {
            store_f32(slot, value);
        }
        self.bump();
    }

    /// Active reverb engine.
    pub fn set_reverb_kind(&self, kind: ReverbKind) {
        self.inner.reverb_kind.store(kind.index() as u32, Ordering::Relaxed);
        self.bump();
    }

    /// Selected mode of a column.
    pub fn selected_mode(&self, column: usize) -> Mode {
        self.inner
            .selected_modes
            .get(column)
            .and_then(|m| Mode::from_index(m.load(Ordering::Relaxed) as usize))
            .unwrap_or_default()
    }

    /// Input gain knob.
    pub fn input_gain(&self) -> f32 {
        load_f32(&self.inner.input_gain)
    }

    /// Phaser noise macro.
    pub fn phaser_noise_gain(&self) -> f32 {
        load_f32(&self.inner.phaser_noise_gain)
    }

    /// Reverb targets.
    pub fn reverb_params(&self) -> ReverbParams {
        let r: [f32; REVERB_FIELDS] = std::array::from_fn(|i| load_f32(&self.inner.reverb[i]));
        ReverbParams {
            mix: r[0],
            gravity: r[1],
            diffusion: r[2],
            damping: r[3],
            mod_freq: r[4],
            mod_depth: r[5],
            time: r[6],
        }
    }

    /// Active reverb engine.
    pub fn reverb_kind(&self) -> ReverbKind {
        ReverbKind::from_index(self.inner.reverb_kind.load(Ordering::Relaxed) as usize).unwrap_or_default()
    }

    /// Reads everything into a state document.
    pub fn to_state(&self) -> PersistedState {
        PersistedState {
            knobs: self.inner.knobs.iter().map(load_f32).collect(),
            selected_modes: std::array::from_fn(|c| self.selected_mode(c).index()),
            input_gain: self.input_gain(),
            reverb: self.reverb_params().into(),
            phaser_noise_gain: self.phaser_noise_gain(),
            reverb_mode: self.reverb_kind().index(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_seeded_from_state() {
        let mut state = PersistedState::default();
        state.knobs[3] = 0.7;
        state.reverb_mode = 2;
        let shared = SharedParams::from_state(&state);
        assert_eq!(shared.to_state(), state);
    }

    #[test]
    fn test_every_write_moves_generation() {
        let shared = SharedParams::default();
        let g0 = shared.generation();
        shared.set_knob(1, Mode::Filter, 1, 0.2);
        shared.select_mode(1, Mode::Filter);
        shared.set_input_gain(0.5);
        shared.set_phaser_noise_gain(0.1);
        shared.set_reverb_params(&ReverbParams::default());
        shared.set_reverb_kind(ReverbKind::Fdn);
        assert_eq!(shared.generation(), g0 + 6);
    }

    #[test]
    fn test_out_of_range_writes_are_ignored() {
        let shared = SharedParams::default();
        let g0 = shared.generation();
        shared.set_knob(COLUMNS, Mode::Delay, 0, 0.3);
        shared.set_knob(0, Mode::Delay, 2, 0.3);
        shared.select_mode(7, Mode::Fx1);
        assert_eq!(shared.generation(), g0);
    }

    #[test]
    fn test_writes_from_another_thread_are_visible() {
        let shared = SharedParams::default();
        let writer = shared.clone();
        thread::spawn(move || {
            for i in 0..100 {
                writer.set_knob(2, Mode::AmpPan, 1, i as f32 / 100.0);
            }
            writer.set_reverb_kind(ReverbKind::Hole);
        })
        .join()
        .unwrap();

        assert_eq!(shared.knob(2, Mode::AmpPan, 1), 0.99);
        assert_eq!(shared.to_state().reverb_kind(), ReverbKind::Hole);
    }
}
