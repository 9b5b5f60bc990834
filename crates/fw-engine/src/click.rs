//! Metronome click synthesis.

use alloc::vec::Vec;
use core::f32::consts::TAU;

use fw_core::SampleBlock;

/// Shape of a single metronome click: a sine burst with a short hold and an
/// exponential fall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickConfig {
    pub frequency_hz: f32,
    /// Full gain is held until this point.
    pub hold_seconds: f32,
    /// Gain reaches `floor_gain` at this point.
    pub decay_end_seconds: f32,
    /// Total click length.
    pub length_seconds: f32,
    pub floor_gain: f32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 1000.0,
            hold_seconds: 0.001,
            decay_end_seconds: 0.020,
            length_seconds: 0.030,
            floor_gain: 0.001,
        }
    }
}

impl ClickConfig {
    /// Gain at `t` seconds into the click.
    pub fn gain_at(&self, t: f32) -> f32 {
        if t <= self.hold_seconds {
            return 1.0;
        }
        if t >= self.decay_end_seconds {
            return self.floor_gain;
        }
        let span = self.decay_end_seconds - self.hold_seconds;
        if span <= 0.0 {
            return self.floor_gain;
        }
        let progress = (t - self.hold_seconds) / span;
        libm::powf(self.floor_gain, progress)
    }
}

/// Render one click at `sample_rate`.
pub fn render_click(config: &ClickConfig, sample_rate: u32) -> SampleBlock {
    if sample_rate == 0 || !config.length_seconds.is_finite() || config.length_seconds <= 0.0 {
        return SampleBlock::empty(sample_rate);
    }
    let len = libm::roundf(config.length_seconds * sample_rate as f32) as usize;
    let rate = sample_rate as f32;
    let samples: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / rate;
            config.gain_at(t) * libm::sinf(TAU * config.frequency_hz * t)
        })
        .collect();
    SampleBlock::new(samples, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_click_is_thirty_ms() {
        let click = render_click(&ClickConfig::default(), 44100);
        assert_eq!(click.len(), 1323);
        assert!(click.peak() <= 1.0);
        assert!(click.peak() > 0.9);
    }

    #[test]
    fn envelope_shape() {
        let config = ClickConfig::default();
        assert_eq!(config.gain_at(0.0), 1.0);
        assert_eq!(config.gain_at(0.001), 1.0);
        assert_relative_eq!(config.gain_at(0.020), 0.001);
        assert_relative_eq!(config.gain_at(0.025), 0.001);
        let mid = config.gain_at(0.0105);
        assert_relative_eq!(mid, libm::powf(0.001, 0.5), epsilon = 1e-5);
        assert!(config.gain_at(0.005) > config.gain_at(0.010));
    }

    #[test]
    fn tail_is_quiet() {
        let click = render_click(&ClickConfig::default(), 48000);
        let tail = &click.samples()[(0.021 * 48000.0) as usize..];
        assert!(tail.iter().all(|s| s.abs() <= 0.001 + 1e-6));
    }

    #[test]
    fn degenerate_config_renders_nothing() {
        let config = ClickConfig { length_seconds: 0.0, ..ClickConfig::default() };
        assert!(render_click(&config, 44100).is_empty());
        assert!(render_click(&ClickConfig::default(), 0).is_empty());
    }
}
