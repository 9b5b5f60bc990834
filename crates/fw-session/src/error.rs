//! Session error type.

use fw_audio::AudioError;
use thiserror::Error;

/// Failure to start part of a session.
///
/// Low-confidence pitch is not an error; it is an unvoiced reading.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The host refused device access. Retrying needs new user consent.
    #[error("audio permission denied: {0}")]
    Permission(String),

    /// The device is missing, busy, or failed to start.
    #[error(transparent)]
    Device(AudioError),

    /// A worker thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },
}

impl From<AudioError> for SessionError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::PermissionDenied(msg) => SessionError::Permission(msg),
            other => SessionError::Device(other),
        }
    }
}

impl SessionError {
    pub fn is_permission(&self) -> bool {
        matches!(self, SessionError::Permission(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
