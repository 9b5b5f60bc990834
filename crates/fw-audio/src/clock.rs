//! Output device clock shared between the render callback and control threads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use fw_engine::AudioClock;

#[derive(Debug, Default)]
struct ClockState {
    frames: AtomicU64,
    started: AtomicBool,
}

/// Playback position of an output stream, in frames rendered.
///
/// Reads `None` until the device has run its first callback.
#[derive(Clone, Debug)]
pub struct DeviceClock {
    state: Arc<ClockState>,
    sample_rate: u32,
}

impl DeviceClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: Arc::new(ClockState::default()),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> Option<u64> {
        if self.state.started.load(Ordering::Acquire) {
            Some(self.state.frames.load(Ordering::Acquire))
        } else {
            None
        }
    }

    /// Publish the render position. Called from the render callback.
    pub(crate) fn publish(&self, frames: u64) {
        self.state.frames.store(frames, Ordering::Release);
        self.state.started.store(true, Ordering::Release);
    }
}

impl AudioClock for DeviceClock {
    fn now(&self) -> Option<f64> {
        if self.sample_rate == 0 {
            return None;
        }
        self.frames()
            .map(|frames| frames as f64 / self.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_until_published() {
        let clock = DeviceClock::new(48000);
        assert_eq!(clock.now(), None);

        let reader = clock.clone();
        clock.publish(0);
        assert_eq!(reader.now(), Some(0.0));
        clock.publish(24000);
        assert_eq!(reader.now(), Some(0.5));
        assert_eq!(reader.frames(), Some(24000));
    }

    #[test]
    fn zero_rate_never_reads() {
        let clock = DeviceClock::new(0);
        clock.publish(100);
        assert_eq!(clock.now(), None);
    }
}
