//! Session configuration.

use std::time::Duration;

use fw_engine::{MetronomeConfig, MixerConfig, PluckConfig};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// Samples per pitch analysis block. 2048 resolves low E at 44.1/48 kHz.
    pub block_size: usize,
    /// How often the analysis thread re-estimates.
    pub refresh_interval: Duration,
    /// Gap between a chord request and its first string.
    pub strum_start_delay: f64,
    /// Stagger between strings when the caller has no preference.
    pub default_strum_delay: f64,
    pub pluck: PluckConfig,
    pub mixer: MixerConfig,
    pub metronome: MetronomeConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            block_size: 2048,
            refresh_interval: Duration::from_millis(16),
            strum_start_delay: 0.02,
            default_strum_delay: 0.05,
            pluck: PluckConfig::default(),
            mixer: MixerConfig::default(),
            metronome: MetronomeConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Set the pitch analysis block size, at least one sample.
    pub fn with_block_size(mut self, samples: usize) -> Self {
        self.block_size = samples.max(1);
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_mixer(mut self, mixer: MixerConfig) -> Self {
        self.mixer = mixer;
        self
    }

    pub fn with_metronome(mut self, metronome: MetronomeConfig) -> Self {
        self.metronome = metronome;
        self
    }

    /// Capacity of the capture ring: several blocks, so a late analysis
    /// pass does not drop input.
    pub(crate) fn capture_capacity(&self) -> usize {
        self.block_size.max(1) * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_sets_capture_capacity() {
        let config = SessionConfig::default().with_block_size(4096);
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.capture_capacity(), 4096 * 8);

        assert_eq!(SessionConfig::default().with_block_size(0).block_size, 1);
    }
}
