//! Session controller for fretwise.
//!
//! Owns the audio devices and worker threads behind the four things a
//! caller can do: follow the pitch of a live input, preview chords, run a
//! metronome, and tear it all down. Every acquisition is scoped: stopping,
//! disposing or dropping the session releases whatever it holds.

mod config;
mod error;
mod metronome_worker;
mod pitch_monitor;

use std::sync::Arc;

use fw_audio::{AudioBackend, PlaybackStream};
use fw_core::{ChordShape, PitchEstimate, StringVoice};
use fw_engine::{clamp_bpm, plan_strum, render_click, AudioClock, SharedBlock};

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use pitch_monitor::{AtomicPitch, PitchReading};

use metronome_worker::MetronomeWorker;
use pitch_monitor::PitchMonitor;

/// Headless session: device lifetime, pitch polling, chord and metronome playback.
pub struct Session<B: AudioBackend> {
    backend: B,
    config: SessionConfig,
    latest: Arc<AtomicPitch>,
    monitor: Option<PitchMonitor>,
    output: Option<PlaybackStream>,
    metronome: Option<MetronomeWorker>,
    bpm: u32,
    click: Option<SharedBlock>,
}

impl<B: AudioBackend> Session<B> {
    pub fn new(backend: B, config: SessionConfig) -> Self {
        Self {
            backend,
            bpm: clamp_bpm(config.metronome.initial_bpm),
            config,
            latest: Arc::new(AtomicPitch::new()),
            monitor: None,
            output: None,
            metronome: None,
            click: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // --- Pitch detection ---

    /// Open the input device and start estimating pitch in the background.
    ///
    /// Calling it while already running does nothing. On failure nothing is
    /// left open.
    pub fn start_pitch_detection(&mut self) -> Result<()> {
        if self.monitor.is_some() {
            return Ok(());
        }
        let stream = self
            .backend
            .open_input(self.config.capture_capacity())
            .inspect_err(|err| tracing::warn!(%err, "could not open input device"))?;
        let (guard, reader) = stream.split();

        self.latest.store(PitchEstimate::unvoiced());
        let monitor = PitchMonitor::spawn(
            guard,
            reader,
            self.config.block_size,
            self.config.refresh_interval,
            self.latest.clone(),
        )?;
        self.monitor = Some(monitor);
        tracing::info!("pitch detection started");
        Ok(())
    }

    /// Stop estimating and release the input device. Idempotent.
    pub fn stop_pitch_detection(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown();
            self.latest.store(PitchEstimate::unvoiced());
            tracing::info!("pitch detection stopped");
        }
    }

    pub fn is_detecting_pitch(&self) -> bool {
        self.monitor.is_some()
    }

    /// Most recent estimate, unvoiced ones included. Lock-free.
    pub fn poll_pitch(&self) -> PitchReading {
        PitchReading::from_estimate(self.latest.load())
    }

    // --- Output ---

    fn ensure_output(&mut self) -> Result<&mut PlaybackStream> {
        if self.output.is_none() {
            let stream = self
                .backend
                .open_output(self.config.mixer)
                .inspect_err(|err| tracing::warn!(%err, "could not open output device"))?;
            tracing::info!(sample_rate = stream.sample_rate(), "output device ready");
            self.output = Some(stream);
        }
        match self.output.as_mut() {
            Some(output) => Ok(output),
            None => Err(SessionError::Device(fw_audio::AudioError::NoDevice)),
        }
    }

    /// Current output device time, if the output is open and running.
    pub fn output_time(&self) -> Option<f64> {
        self.output.as_ref().and_then(|o| o.clock().now())
    }

    /// Strum up to six strings, low to high, `strum_delay` seconds apart.
    ///
    /// Muted strings are skipped. Opens the output device on first use.
    /// Returns the number of strings queued.
    pub fn play_chord(&mut self, voices: &[StringVoice; 6], strum_delay: f64) -> Result<usize> {
        let pluck = self.config.pluck;
        let lead = self.config.strum_start_delay;
        let output = self.ensure_output()?;
        output.collect_retired();

        let start = output.clock().now().unwrap_or(0.0) + lead;
        let events = plan_strum(
            voices,
            start,
            strum_delay,
            &pluck,
            output.sample_rate(),
            &mut rand::thread_rng(),
        );

        let mut queued = 0;
        for event in events {
            if output.play(event.map(Arc::new)).is_ok() {
                queued += 1;
            } else {
                tracing::warn!("output lane full, string dropped");
            }
        }
        tracing::debug!(strings = queued, start, strum_delay, "chord queued");
        Ok(queued)
    }

    /// Strum a named shape with the default stagger.
    pub fn play_shape(&mut self, shape: &ChordShape) -> Result<usize> {
        self.play_chord(&shape.voices(), self.config.default_strum_delay)
    }

    // --- Metronome ---

    /// Set the tempo, clamped to 30..=300 BPM. Returns the tempo applied.
    ///
    /// A running metronome picks it up after its pending click.
    pub fn set_metronome_rate(&mut self, bpm: u32) -> u32 {
        self.bpm = clamp_bpm(bpm);
        if let Some(worker) = &self.metronome {
            worker.set_rate(self.bpm);
        }
        self.bpm
    }

    pub fn metronome_rate(&self) -> u32 {
        self.bpm
    }

    pub fn is_metronome_running(&self) -> bool {
        self.metronome.is_some()
    }

    /// Start the click train. Does nothing if already running.
    pub fn start_metronome(&mut self) -> Result<()> {
        if self.metronome.is_some() {
            return Ok(());
        }
        let click_config = self.config.metronome.click;
        let metronome_config = self.config.metronome;
        let bpm = self.bpm;
        let output = self.ensure_output()?;
        let sample_rate = output.sample_rate();
        let clock = output.clock().clone();
        let Some(lane) = output.take_metronome_lane() else {
            return Err(SessionError::Device(fw_audio::AudioError::Playback(
                "metronome lane unavailable".into(),
            )));
        };

        let click = match &self.click {
            Some(click) if click.sample_rate() == sample_rate => click.clone(),
            _ => Arc::new(render_click(&click_config, sample_rate)),
        };

        match MetronomeWorker::spawn(metronome_config, bpm, clock, lane, click.clone()) {
            Ok(worker) => {
                self.metronome = Some(worker);
                self.click = Some(click);
                Ok(())
            }
            Err(err) => {
                // The lane went down with the thread; reopen output next time.
                self.output = None;
                Err(err)
            }
        }
    }

    /// Stop the click train. Already-queued clicks may still sound. Idempotent.
    pub fn stop_metronome(&mut self) {
        let Some(worker) = self.metronome.take() else {
            return;
        };
        if let Some(lane) = worker.shutdown() {
            if let Some(output) = self.output.as_mut() {
                output.restore_metronome_lane(lane);
            }
        }
    }

    // --- Teardown ---

    /// Stop everything and release every device. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.stop_metronome();
        self.stop_pitch_detection();
        if let Some(mut output) = self.output.take() {
            output.collect_retired();
            tracing::info!("output device released");
        }
        self.click = None;
    }
}

impl<B: AudioBackend> Drop for Session<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
