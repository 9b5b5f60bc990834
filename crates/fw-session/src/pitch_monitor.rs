//! Background pitch analysis and the lock-free latest-estimate cell.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use fw_audio::{CaptureReader, StreamGuard};
use fw_core::{Note, PitchEstimate, SignalBuffer, TuningStatus};
use fw_engine::estimate_samples;

use crate::error::{Result, SessionError};

/// Latest estimate, published by the analysis thread and read by pollers.
///
/// Frequency bits and the voiced flag share one word so a reader never sees
/// a torn pair.
#[derive(Debug, Default)]
pub struct AtomicPitch(AtomicU64);

impl AtomicPitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, estimate: PitchEstimate) {
        let bits = (estimate.frequency_hz.to_bits() as u64) << 32 | estimate.is_voiced as u64;
        self.0.store(bits, Ordering::Release);
    }

    pub fn load(&self) -> PitchEstimate {
        let bits = self.0.load(Ordering::Acquire);
        let frequency_hz = f32::from_bits((bits >> 32) as u32);
        if bits & 1 == 1 {
            PitchEstimate::voiced(frequency_hz)
        } else {
            PitchEstimate::unvoiced()
        }
    }
}

/// Display-ready view of a pitch estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PitchReading {
    /// Frequency rounded to whole Hz; 0 when unvoiced.
    pub frequency_hz: u32,
    pub note: Option<Note>,
    pub cents: Option<i32>,
    pub is_voiced: bool,
    pub estimate: PitchEstimate,
}

impl PitchReading {
    pub fn from_estimate(estimate: PitchEstimate) -> Self {
        Self {
            frequency_hz: estimate.display_frequency(),
            note: estimate.note(),
            cents: estimate.cents(),
            is_voiced: estimate.is_voiced,
            estimate,
        }
    }

    /// Tuner status against the nearest note.
    pub fn status(&self) -> Option<TuningStatus> {
        self.cents.map(TuningStatus::from_cents)
    }
}

/// Running analysis thread plus the input stream it reads.
pub(crate) struct PitchMonitor {
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
    _stream: StreamGuard,
}

impl PitchMonitor {
    pub(crate) fn spawn(
        guard: StreamGuard,
        reader: CaptureReader,
        block_size: usize,
        refresh: Duration,
        latest: Arc<AtomicPitch>,
    ) -> Result<Self> {
        let (stop, stop_rx) = crossbeam_channel::bounded(1);
        let thread = std::thread::Builder::new()
            .name("fw-pitch".into())
            .spawn(move || analysis_loop(reader, block_size, refresh, latest, stop_rx))
            .map_err(|source| SessionError::Spawn {
                name: "pitch analysis",
                source,
            })?;

        Ok(Self {
            stop,
            thread: Some(thread),
            _stream: guard,
        })
    }

    /// Stop the thread and wait for it. The input stream is released on drop.
    pub(crate) fn shutdown(mut self) {
        let _ = self.stop.try_send(());
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::warn!("pitch analysis thread panicked");
            }
        }
    }
}

fn analysis_loop(
    mut reader: CaptureReader,
    block_size: usize,
    refresh: Duration,
    latest: Arc<AtomicPitch>,
    stop: Receiver<()>,
) {
    let sample_rate = reader.sample_rate();
    let mut buffer = SignalBuffer::new(block_size);
    let mut block = vec![0.0f32; block_size];
    tracing::debug!(block_size, sample_rate, "pitch analysis started");

    loop {
        match stop.recv_timeout(refresh) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        if reader.drain_into(&mut buffer) == 0 || !buffer.is_full() {
            continue;
        }
        buffer.snapshot_into(&mut block);
        latest.store(estimate_samples(&block, sample_rate));
    }

    tracing::debug!("pitch analysis stopped");
}
