//! # Tuning Loop Module
//!
//! The stateful scheduler that drives the analysis pipeline against live
//! audio. While running, a single worker thread repeatedly pulls one block
//! from the audio source, runs it through pitch detection and tuning
//! evaluation, publishes the result, and sleeps for the cycle interval.
//!
//! ## Guarantees
//! - At most one worker per loop: `start()` while running is a no-op
//! - `stop()` joins the worker, so no publication happens after it returns
//! - The source is owned by the worker while running and released before
//!   the worker exits, so a later `start()` can reacquire it
//! - Transient capture failures degrade to a "no note detected" result;
//!   only `stop()` (or dropping the loop) ends the cycle

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};

use crate::source::AudioSource;
use crate::tuning::{self, Tuning};
use crate::{ResultSlot, TuningResult};

/// Pause between analysis cycles. Roughly ten result updates per second is
/// plenty for live visual feedback; the value is a tunable, not a
/// correctness constraint.
pub const CYCLE_INTERVAL: Duration = Duration::from_millis(100);

/// Worker thread management for one running loop.
///
/// The thread hands the audio source back through its join handle when it
/// exits.
#[derive(Debug)]
struct Worker<S> {
    shutdown_tx: Sender<()>,
    handle: JoinHandle<S>,
}

/// Loop state guarded by the inner mutex. Exactly one of `source`/`worker`
/// is populated: the source lives here while idle and on the worker thread
/// while running.
#[derive(Debug)]
struct Inner<S> {
    source: Option<S>,
    worker: Option<Worker<S>>,
}

/// The tuning loop: `Idle`/`Running` state machine over an audio source.
///
/// `start`, `stop` and `toggle` take `&self` and are guarded internally, so
/// a loop shared behind an `Arc` can be controlled from any thread (UI
/// event handlers included) without extra locking.
#[derive(Debug)]
pub struct TuningLoop<S: AudioSource + 'static> {
    slot: Arc<ResultSlot>,
    tuning: Arc<Tuning>,
    inner: Mutex<Inner<S>>,
}

impl<S: AudioSource + 'static> TuningLoop<S> {
    pub fn new(source: S, tuning: Tuning) -> Self {
        Self {
            slot: ResultSlot::new(),
            tuning: Arc::new(tuning),
            inner: Mutex::new(Inner {
                source: Some(source),
                worker: None,
            }),
        }
    }

    /// The publication cell subscribers read results from.
    pub fn results(&self) -> Arc<ResultSlot> {
        Arc::clone(&self.slot)
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().unwrap().worker.is_some()
    }

    /// Transitions to `Running` and spawns the worker. No-op if already
    /// running. A source that cannot currently supply samples is not fatal:
    /// the worker keeps cycling on empty blocks and retries `prepare()`
    /// each cycle until the source becomes available.
    pub fn start(&self) {
        self.start_locked(&mut self.inner.lock().unwrap());
    }

    /// Transitions to `Idle`. No-op if already idle. The in-flight cycle is
    /// allowed to finish; once this returns, the worker has exited, the
    /// source is released, and no further result is published.
    pub fn stop(&self) {
        self.stop_locked(&mut self.inner.lock().unwrap());
    }

    /// `stop()` if running, `start()` otherwise, atomically with respect to
    /// other control calls.
    pub fn toggle(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.worker.is_some() {
            self.stop_locked(&mut inner);
        } else {
            self.start_locked(&mut inner);
        }
    }

    fn start_locked(&self, inner: &mut MutexGuard<'_, Inner<S>>) {
        if inner.worker.is_some() {
            return;
        }
        let Some(mut source) = inner.source.take() else {
            // Only reachable if a previous worker panicked and took the
            // source with it.
            eprintln!("[LOOP] Cannot start: audio source is gone");
            return;
        };

        let slot = Arc::clone(&self.slot);
        let tuning = Arc::clone(&self.tuning);
        let (shutdown_tx, shutdown_rx) = bounded(1);

        let handle = thread::spawn(move || {
            let mut prepared = match source.prepare() {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("[LOOP] Audio source unavailable: {}", e);
                    false
                }
            };

            loop {
                // While degraded, keep trying to reacquire the device so a
                // source that was not ready at start() can come online
                // mid-session. Until it does, capture() yields empty blocks
                // and the cycle publishes no-signal results.
                if !prepared && source.prepare().is_ok() {
                    eprintln!("[LOOP] Audio source recovered");
                    prepared = true;
                }

                let block = source.capture();
                let result = analyze_block(&block, source.sample_rate(), &tuning);
                slot.publish(result);

                // The inter-cycle sleep doubles as the shutdown check.
                match shutdown_rx.recv_timeout(CYCLE_INTERVAL) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }

            source.release();
            source
        });

        inner.worker = Some(Worker {
            shutdown_tx,
            handle,
        });
    }

    fn stop_locked(&self, inner: &mut MutexGuard<'_, Inner<S>>) {
        let Some(worker) = inner.worker.take() else {
            return;
        };
        let _ = worker.shutdown_tx.send(());
        match worker.handle.join() {
            Ok(source) => inner.source = Some(source),
            Err(_) => eprintln!("[LOOP] Worker thread panicked; audio source lost"),
        }
    }
}

impl<S: AudioSource + 'static> Drop for TuningLoop<S> {
    /// Tearing down the loop always stops it first, so no orphaned cycle
    /// outlives its owner.
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs one block through the full pipeline: estimate frequency, match the
/// nearest reference note, evaluate the deviation.
///
/// A block with no detectable pitch (empty, silent, or noise) produces the
/// no-signal result.
pub fn analyze_block(block: &[i16], sample_rate: u32, tuning: &Tuning) -> TuningResult {
    let frequency = crate::pitch::detect_frequency(block, sample_rate);
    if frequency == 0.0 {
        return TuningResult::no_signal();
    }

    let note = tuning.nearest(frequency);
    let cents_deviation = tuning::cents_deviation(frequency, note.frequency);
    TuningResult {
        note: Some(note.clone()),
        cents_deviation,
        in_tune: tuning::is_in_tune(cents_deviation),
        frequency,
    }
}
