//! Audio device backends for fretwise.
//!
//! A backend hands out capture and playback streams. The device callbacks
//! talk to the rest of the program only through the lock-free rings in
//! [`stream`], so neither callback blocks or allocates.

mod clock;
mod cpal_backend;
pub mod sim;
pub mod stream;
mod traits;

pub use clock::DeviceClock;
pub use cpal_backend::CpalBackend;
pub use sim::{SimBackend, SimDevice};
pub use stream::{
    capture_channel, playback_channel, CaptureReader, CaptureStream, CaptureWriter, OutputLane,
    PlaybackHandle, PlaybackStream, RenderEnd, StreamGuard,
};
pub use traits::{AudioBackend, AudioError};
