//! Audio backend trait and error types.

use fw_engine::MixerConfig;
use thiserror::Error;

use crate::stream::{CaptureStream, PlaybackStream};

/// Error type for audio device operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// No audio device available
    #[error("no audio device available")]
    NoDevice,
    /// The host refused access to the device
    #[error("device access denied: {0}")]
    PermissionDenied(String),
    /// Failed to initialize audio device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create audio stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),
}

impl AudioError {
    pub fn is_permission(&self) -> bool {
        matches!(self, AudioError::PermissionDenied(_))
    }
}

/// Source of capture and playback streams.
///
/// Streams stay open for as long as the returned value lives; dropping it
/// releases the device.
pub trait AudioBackend {
    /// Open the default input device. Captured audio is downmixed to mono
    /// and buffered up to `capacity` samples.
    fn open_input(&mut self, capacity: usize) -> Result<CaptureStream, AudioError>;

    /// Open the default output device, rendering through a fresh mixer.
    fn open_output(&mut self, mixer: MixerConfig) -> Result<PlaybackStream, AudioError>;
}

impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    fn open_input(&mut self, capacity: usize) -> Result<CaptureStream, AudioError> {
        (**self).open_input(capacity)
    }

    fn open_output(&mut self, mixer: MixerConfig) -> Result<PlaybackStream, AudioError> {
        (**self).open_output(mixer)
    }
}
