//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform
//! Audio Library). It implements [`AudioSource`] for the default input
//! device, with an explicit lifecycle (`Unprepared` → `Prepared` →
//! `Released`) instead of a nullable device handle.
//!
//! ## Features
//! - Automatic audio device selection
//! - Fixed-size PCM block delivery to the tuning loop
//! - Capture failures degrade to empty blocks, never errors
//!
//! `cpal::Stream` is not `Send`, so the stream lives on a dedicated capture
//! thread for as long as the source is prepared; `capture()` receives
//! finished blocks over a bounded channel.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, bounded};

use crate::source::AudioSource;

/// Audio buffer size for capture blocks.
///
/// This constant defines the number of samples per capture window. The
/// autocorrelation estimator is quadratic in this length, so it trades
/// frequency resolution against per-cycle cost. 2048 samples is ~46ms at
/// 44.1kHz.
pub const BUFFER_SIZE: usize = 2048;

/// Default requested sample rate in Hz (CD quality).
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// How long `capture()` waits for a fresh block before giving up and
/// reporting silence for the cycle. Blocks normally arrive every ~46ms.
const CAPTURE_TIMEOUT: Duration = Duration::from_millis(250);

/// Lifecycle of the capture device.
#[derive(Debug)]
enum CaptureState {
    /// No device acquired yet.
    Unprepared,
    /// Capture thread running, stream open.
    Prepared {
        shutdown_tx: Sender<()>,
        blocks: Receiver<Vec<i16>>,
        thread: JoinHandle<()>,
    },
    /// Device released; `prepare()` may reacquire.
    Released,
}

/// Microphone-backed [`AudioSource`] on the default cpal input device.
#[derive(Debug)]
pub struct MicSource {
    sample_rate: u32,
    state: CaptureState,
}

impl MicSource {
    /// Creates a source that will request the given sample rate. The
    /// device is not touched until [`prepare`](AudioSource::prepare).
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: CaptureState::Unprepared,
        }
    }
}

impl Default for MicSource {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AudioSource for MicSource {
    fn prepare(&mut self) -> Result<()> {
        if matches!(self.state, CaptureState::Prepared { .. }) {
            return Ok(());
        }

        let (ready_tx, ready_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded(1);
        let (block_tx, block_rx) = bounded::<Vec<i16>>(1);
        let sample_rate = self.sample_rate;

        // The stream is created, parked on, and dropped entirely on this
        // thread because it is not Send.
        let thread = thread::spawn(move || {
            let stream = match open_input_stream(sample_rate, block_tx) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // Park until release() signals, then tear the stream down.
            let _ = shutdown_rx.recv();
            if let Err(e) = stream.pause() {
                eprintln!("[AUDIO] Error pausing stream: {}", e);
            }
            drop(stream);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.state = CaptureState::Prepared {
                    shutdown_tx,
                    blocks: block_rx,
                    thread,
                };
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(anyhow!("audio capture thread exited during setup"))
            }
        }
    }

    fn capture(&mut self) -> Vec<i16> {
        let CaptureState::Prepared { blocks, .. } = &self.state else {
            return Vec::new();
        };

        // Discard anything that piled up since last cycle so the result
        // reflects what is sounding now.
        let mut latest = None;
        while let Ok(block) = blocks.try_recv() {
            latest = Some(block);
        }
        if let Some(block) = latest {
            return block;
        }

        blocks.recv_timeout(CAPTURE_TIMEOUT).unwrap_or_default()
    }

    fn release(&mut self) {
        let previous = std::mem::replace(&mut self.state, CaptureState::Released);
        if let CaptureState::Prepared {
            shutdown_tx,
            thread,
            ..
        } = previous
        {
            let _ = shutdown_tx.send(());
            let _ = thread.join();
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Opens an input stream on the default device and starts it.
///
/// The stream callback accumulates samples until a full block of
/// `BUFFER_SIZE` is available, widens them to i16 PCM, and offers the block
/// to the capture channel. If the consumer has not taken the previous block
/// yet, the new one is dropped; the tuner only ever wants recent audio.
fn open_input_stream(sample_rate: u32, block_tx: Sender<Vec<i16>>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    println!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, sample_rate)
        .ok_or_else(|| anyhow!("No mono f32 input config supporting {} Hz", sample_rate))?;

    let config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(sample_rate))
        .into();

    println!("Selected sample rate: {} Hz", sample_rate);

    let err_fn = |err| eprintln!("[AUDIO] An error occurred on the audio stream: {}", err);

    // This buffer accumulates audio data from the callback.
    let mut audio_buffer: Vec<i16> = Vec::with_capacity(BUFFER_SIZE * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            audio_buffer.extend(
                data.iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
            );

            // While we have enough data for a full block, hand it off.
            while audio_buffer.len() >= BUFFER_SIZE {
                let block = audio_buffer[..BUFFER_SIZE].to_vec();
                let _ = block_tx.try_send(block);
                audio_buffer.drain(..BUFFER_SIZE);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok(stream)
}

/// Finds a mono f32 input configuration whose sample-rate range contains
/// the target rate.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs.into_iter().find(|c| {
        c.channels() == 1
            && c.sample_format() == cpal::SampleFormat::F32
            && c.min_sample_rate().0 <= target_rate
            && target_rate <= c.max_sample_rate().0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprepared_source_captures_empty_block() {
        let mut source = MicSource::new(DEFAULT_SAMPLE_RATE);
        assert!(source.capture().is_empty());
    }

    #[test]
    fn released_source_captures_empty_block() {
        let mut source = MicSource::new(DEFAULT_SAMPLE_RATE);
        source.release();
        assert!(source.capture().is_empty());
    }
}
