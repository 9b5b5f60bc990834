//! Simulated audio device for headless runs and tests.
//!
//! [`SimBackend`] hands out real streams built on the same rings as the CPAL
//! backend. The paired [`SimDevice`] plays the part of the hardware: it
//! feeds input samples and pulls rendered output on demand, so time only
//! advances when the caller renders.

use std::sync::{Arc, Mutex, MutexGuard};

use fw_engine::{Mixer, MixerConfig};

use crate::stream::{
    capture_channel, playback_channel, CaptureStream, CaptureWriter, PlaybackStream, RenderEnd,
    StreamGuard,
};
use crate::traits::{AudioBackend, AudioError};

#[derive(Default)]
struct SimState {
    input: Option<CaptureWriter>,
    output: Option<RenderEnd>,
    input_error: Option<AudioError>,
    output_error: Option<AudioError>,
    inputs_opened: usize,
    outputs_opened: usize,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    // A panicking test thread must not wedge the others.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Backend half of a simulated device.
pub struct SimBackend {
    sample_rate: u32,
    state: Arc<Mutex<SimState>>,
}

/// Hardware half of a simulated device.
#[derive(Clone)]
pub struct SimDevice {
    sample_rate: u32,
    state: Arc<Mutex<SimState>>,
}

impl SimBackend {
    pub fn new(sample_rate: u32) -> (Self, SimDevice) {
        let state = Arc::new(Mutex::new(SimState::default()));
        (
            Self {
                sample_rate,
                state: state.clone(),
            },
            SimDevice { sample_rate, state },
        )
    }
}

impl AudioBackend for SimBackend {
    fn open_input(&mut self, capacity: usize) -> Result<CaptureStream, AudioError> {
        let mut state = lock(&self.state);
        if let Some(err) = state.input_error.clone() {
            return Err(err);
        }
        let (writer, reader) = capture_channel(capacity, self.sample_rate);
        state.input = Some(writer);
        state.inputs_opened += 1;
        Ok(CaptureStream::new(reader, StreamGuard::detached("sim-input")))
    }

    fn open_output(&mut self, mixer: MixerConfig) -> Result<PlaybackStream, AudioError> {
        let mut state = lock(&self.state);
        if let Some(err) = state.output_error.clone() {
            return Err(err);
        }
        let (handle, render) = playback_channel(mixer, self.sample_rate);
        state.output = Some(render);
        state.outputs_opened += 1;
        Ok(PlaybackStream::new(handle, StreamGuard::detached("sim-output")))
    }
}

impl SimDevice {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Make every later `open_input` fail with `err`.
    pub fn fail_input(&self, err: AudioError) {
        lock(&self.state).input_error = Some(err);
    }

    /// Make every later `open_output` fail with `err`.
    pub fn fail_output(&self, err: AudioError) {
        lock(&self.state).output_error = Some(err);
    }

    pub fn inputs_opened(&self) -> usize {
        lock(&self.state).inputs_opened
    }

    pub fn outputs_opened(&self) -> usize {
        lock(&self.state).outputs_opened
    }

    /// Deliver mono samples as if captured. Returns the number accepted,
    /// or 0 when no input is open.
    pub fn feed_input(&self, samples: &[f32]) -> usize {
        match lock(&self.state).input.as_mut() {
            Some(writer) => writer.write_interleaved(samples, 1),
            None => 0,
        }
    }

    /// Run the output callback for `frames` frames of `channels` channels.
    ///
    /// Returns `None` when no output is open.
    pub fn render(&self, frames: usize, channels: usize) -> Option<Vec<f32>> {
        let mut state = lock(&self.state);
        let render = state.output.as_mut()?;
        let mut out = vec![0.0f32; frames * channels.max(1)];
        render.render(&mut out, channels);
        Some(out)
    }

    /// Inspect the output mixer, e.g. its pending voices.
    pub fn with_mixer<R>(&self, f: impl FnOnce(&Mixer) -> R) -> Option<R> {
        lock(&self.state).output.as_ref().map(|render| f(render.mixer()))
    }
}
