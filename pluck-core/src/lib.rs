// pluck-core/src/lib.rs

//! The core logic for the instrument tuner.
//! This crate is responsible for audio capture, pitch detection,
//! and tuning evaluation against a reference table. It is completely
//! headless and contains no UI code.

pub mod audio;
pub mod engine;
pub mod pitch;
pub mod source;
pub mod tuning;

use std::sync::{Arc, Mutex};

use crate::tuning::Note;

/// The outcome of a single analysis cycle.
///
/// When no pitch could be detected (silence, noise, or no audio available
/// this cycle), `frequency` is `0.0`, `note` is `None`, `cents_deviation`
/// is `0.0` and `in_tune` is `false`. When `note` is present, `frequency`
/// is strictly positive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TuningResult {
    /// The nearest reference note, if a pitch was detected.
    pub note: Option<Note>,
    /// Deviation from the matched note in cents (positive = sharp).
    pub cents_deviation: f32,
    /// Whether the deviation is inside the in-tune window.
    pub in_tune: bool,
    /// The detected fundamental frequency in Hz, or `0.0` for no signal.
    pub frequency: f32,
}

impl TuningResult {
    /// The "no note detected" result published for silent or failed cycles.
    pub fn no_signal() -> Self {
        Self::default()
    }
}

/// Last-write-wins publication cell for [`TuningResult`].
///
/// The tuning loop overwrites the slot once per cycle; subscribers read the
/// current value whenever they like. A slow reader misses intermediate
/// results rather than applying backpressure to the loop.
#[derive(Debug, Default)]
pub struct ResultSlot {
    current: Mutex<TuningResult>,
}

impl ResultSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replaces the published result. Called only by the loop worker.
    pub fn publish(&self, result: TuningResult) {
        *self.current.lock().unwrap() = result;
    }

    /// Returns a copy of the most recently published result.
    pub fn latest(&self) -> TuningResult {
        self.current.lock().unwrap().clone()
    }
}
