//! # Audio Source Capability
//!
//! The in-process contract between the tuning loop and whatever supplies
//! audio. The loop owns its source exclusively while running; capture
//! failures are reported as empty blocks, never as errors, so a transient
//! device problem degrades to "no note detected" instead of killing the
//! loop.

use anyhow::Result;

/// A supplier of fixed-size blocks of signed 16-bit mono PCM.
///
/// Implementations must be `Send`: the tuning loop moves the source onto
/// its worker thread while running and hands it back on stop.
pub trait AudioSource: Send {
    /// Acquires the capture device. May be called again after
    /// [`release`](AudioSource::release) to reacquire.
    ///
    /// # Errors
    /// Fails if the device cannot be opened or configured. The loop treats
    /// this as non-fatal: it logs and keeps cycling, and every subsequent
    /// `capture` returns an empty block until the source recovers.
    fn prepare(&mut self) -> Result<()>;

    /// Captures one sample block.
    ///
    /// Returns an empty block on any failure: device not prepared, no
    /// permission, or no data available this cycle.
    fn capture(&mut self) -> Vec<i16>;

    /// Releases the capture device and any resources behind it.
    fn release(&mut self);

    /// Sample rate of the blocks this source produces, in Hz. Constant for
    /// the lifetime of the source.
    fn sample_rate(&self) -> u32;
}
