//! Karplus-Strong plucked-string synthesis.
//!
//! A delay line of one period is seeded with white noise, then each new
//! sample averages the two samples one period back and scales by the
//! string's decay:
//!
//! ```text
//! y[i] = decay * 0.5 * (y[i - P] + y[i - P - 1])      (y[P - 1 - P] taken as 0)
//! ```
//!
//! The averaging is a lowpass in the feedback loop, so upper partials die
//! out faster than the fundamental, which is what makes it sound plucked.

use fw_core::{SampleBlock, StringVoice};
use rand::Rng;

use alloc::vec;

/// Default pluck length.
pub const DEFAULT_PLUCK_SECONDS: f32 = 1.5;

/// Longest pluck rendered; longer requests are cut to this length.
pub const MAX_PLUCK_SECONDS: f32 = 30.0;

/// Synthesis parameters shared by every pluck.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PluckConfig {
    /// Length of each rendered string, in seconds. Capped at
    /// [`MAX_PLUCK_SECONDS`]; non-positive or non-finite values give an
    /// empty block.
    pub duration_seconds: f32,
}

impl Default for PluckConfig {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_PLUCK_SECONDS,
        }
    }
}

impl PluckConfig {
    /// Set the rendered length of each string.
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration_seconds = seconds;
        self
    }
}

/// Delay-line length in samples for a fundamental at `frequency_hz`.
///
/// Always at least 1.
pub fn period_samples(frequency_hz: f32, sample_rate: u32) -> usize {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return 1;
    }
    let period = libm::roundf(sample_rate as f32 / frequency_hz);
    if period < 1.0 {
        1
    } else {
        period as usize
    }
}

fn sanitize_decay(decay: f32) -> f32 {
    if decay.is_finite() {
        decay.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Synthesize a pluck of `voice` into `out`, overwriting it.
///
/// Returns the number of samples written, which is always `out.len()`.
/// A muted voice writes silence. Allocation-free.
pub fn pluck_into<R: Rng + ?Sized>(
    voice: &StringVoice,
    out: &mut [f32],
    sample_rate: u32,
    rng: &mut R,
) -> usize {
    if voice.is_muted() || sample_rate == 0 {
        out.fill(0.0);
        return out.len();
    }

    let period = period_samples(voice.effective_frequency(), sample_rate);
    let decay = sanitize_decay(voice.decay);

    let seeded = period.min(out.len());
    for sample in &mut out[..seeded] {
        *sample = rng.gen_range(-1.0f32..=1.0);
    }

    for i in period..out.len() {
        let older = if i > period { out[i - period - 1] } else { 0.0 };
        out[i] = decay * 0.5 * (out[i - period] + older);
    }

    out.len()
}

/// Synthesize `duration_seconds` of `voice` using the supplied randomness.
///
/// A muted voice, or a duration that is not a positive finite number,
/// yields an empty block without allocating.
pub fn pluck_with_rng<R: Rng + ?Sized>(
    voice: &StringVoice,
    duration_seconds: f32,
    sample_rate: u32,
    rng: &mut R,
) -> SampleBlock {
    if voice.is_muted() {
        return SampleBlock::empty(sample_rate);
    }
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return SampleBlock::empty(sample_rate);
    }
    let seconds = duration_seconds.min(MAX_PLUCK_SECONDS);
    let len = libm::roundf(sample_rate as f32 * seconds) as usize;
    let mut samples = vec![0.0f32; len];
    pluck_into(voice, &mut samples, sample_rate, rng);
    SampleBlock::new(samples, sample_rate)
}

/// Synthesize `duration_seconds` of `voice` seeded from the thread RNG.
#[cfg(feature = "std")]
pub fn pluck(voice: &StringVoice, duration_seconds: f32, sample_rate: u32) -> SampleBlock {
    pluck_with_rng(voice, duration_seconds, sample_rate, &mut rand::thread_rng())
}
