//! CPAL-based capture and playback backend.

use std::fmt::Display;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Host, SampleFormat, StreamConfig};
use fw_engine::MixerConfig;

use crate::stream::{capture_channel, playback_channel, CaptureStream, PlaybackStream, StreamGuard};
use crate::traits::{AudioBackend, AudioError};

/// Default-device backend on the platform's default CPAL host.
pub struct CpalBackend {
    host: Host,
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }
}

/// Host messages that indicate the user or OS refused device access.
fn looks_like_permission(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["permission", "denied", "not authorized", "unauthorized"]
        .iter()
        .any(|needle| message.contains(needle))
}

fn classify(err: impl Display, kind: fn(String) -> AudioError) -> AudioError {
    let message = err.to_string();
    if looks_like_permission(&message) {
        AudioError::PermissionDenied(message)
    } else {
        kind(message)
    }
}

fn build_error(err: cpal::BuildStreamError) -> AudioError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => AudioError::NoDevice,
        other => classify(other, AudioError::StreamCreate),
    }
}

fn require_f32(sample_format: SampleFormat) -> Result<(), AudioError> {
    if sample_format == SampleFormat::F32 {
        Ok(())
    } else {
        Err(AudioError::DeviceInit(format!(
            "unsupported sample format {sample_format:?} (only f32 supported)"
        )))
    }
}

impl AudioBackend for CpalBackend {
    fn open_input(&mut self, capacity: usize) -> Result<CaptureStream, AudioError> {
        let device = self
            .host
            .default_input_device()
            .ok_or(AudioError::NoDevice)?;

        let supported = device
            .default_input_config()
            .map_err(|e| classify(e, AudioError::DeviceInit))?;
        require_f32(supported.sample_format())?;

        let config: StreamConfig = supported.into();
        let channels = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        let (mut writer, reader) = capture_channel(capacity, sample_rate);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    writer.write_interleaved(data, channels);
                },
                |err| tracing::warn!(%err, "audio input stream error"),
                None,
            )
            .map_err(build_error)?;

        stream
            .play()
            .map_err(|e| classify(e, AudioError::Playback))?;

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            channels,
            "opened input device"
        );
        Ok(CaptureStream::new(reader, StreamGuard::new(stream, "input")))
    }

    fn open_output(&mut self, mixer: MixerConfig) -> Result<PlaybackStream, AudioError> {
        let device = self
            .host
            .default_output_device()
            .ok_or(AudioError::NoDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| classify(e, AudioError::DeviceInit))?;
        require_f32(supported.sample_format())?;

        let config: StreamConfig = supported.into();
        let channels = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        let (handle, mut render) = playback_channel(mixer, sample_rate);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render.render(data, channels);
                },
                |err| tracing::warn!(%err, "audio output stream error"),
                None,
            )
            .map_err(build_error)?;

        stream
            .play()
            .map_err(|e| classify(e, AudioError::Playback))?;

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            channels,
            "opened output device"
        );
        Ok(PlaybackStream::new(handle, StreamGuard::new(stream, "output")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_messages_are_recognised() {
        assert!(looks_like_permission("Microphone access Denied by user"));
        assert!(looks_like_permission("app is not authorized to record"));
        assert!(!looks_like_permission("device disconnected"));
    }

    #[test]
    fn classify_falls_back_to_kind() {
        assert_eq!(
            classify("stream vanished", AudioError::StreamCreate),
            AudioError::StreamCreate("stream vanished".into())
        );
        assert!(classify("Permission denied (os error 13)", AudioError::DeviceInit).is_permission());
    }

    #[test]
    fn unavailable_device_maps_to_no_device() {
        assert_eq!(
            build_error(cpal::BuildStreamError::DeviceNotAvailable),
            AudioError::NoDevice
        );
    }
}
