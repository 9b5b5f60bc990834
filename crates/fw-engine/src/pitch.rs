//! Fundamental-frequency estimation by normalized difference correlation.
//!
//! For each lag `offset` in `[0, N/2)` the block is compared against a
//! shifted copy of itself:
//!
//! ```text
//! correlation(offset) = 1 - Σ_{i < N/2} |x[i] - x[i + offset]| / (N/2)
//! ```
//!
//! A lag becomes a candidate once its correlation exceeds
//! [`GOOD_CORRELATION`] while still rising, which skips the small-offset
//! region before the first period. The first fall after a run of candidates
//! marks the peak; it is refined with the two neighbouring correlations.
//!
//! The magnitude-difference correlation is not amplitude-normalized, so a
//! quiet noise floor sits close to 1 everywhere. Candidates must therefore
//! also rise well above the deepest dip seen so far (McLeod-style clarity,
//! [`MIN_CLARITY`]); random wiggles in noise never do.
//!
//! The estimator is stateless and allocation-free. Successive blocks may
//! flicker between octaves on transients; smoothing is the caller's job
//! (see [`crate::practice::NoteMatcher`]).

use fw_core::{PitchEstimate, SampleBlock};

/// Blocks with RMS below this are treated as silence.
pub const SILENCE_RMS: f32 = 0.01;

/// Correlation a lag must exceed to become a period candidate.
pub const GOOD_CORRELATION: f32 = 0.9;

/// Best correlation below this means no pitch was found.
pub const MIN_CORRELATION: f32 = 0.01;

/// Minimum rise of a candidate above the deepest dip, relative to the dip depth.
pub const MIN_CLARITY: f32 = 0.5;

/// Estimate the fundamental of a block.
pub fn estimate(block: &SampleBlock) -> PitchEstimate {
    estimate_samples(block.samples(), block.sample_rate())
}

/// Estimate the fundamental of raw samples captured at `sample_rate` Hz.
///
/// Degenerate input (zero rate, fewer than four samples, silence) yields
/// an unvoiced estimate.
pub fn estimate_samples(samples: &[f32], sample_rate: u32) -> PitchEstimate {
    let half = samples.len() / 2;
    if half < 2 || sample_rate == 0 {
        return PitchEstimate::unvoiced();
    }

    if rms(samples) < SILENCE_RMS {
        return PitchEstimate::unvoiced();
    }

    let mut best_offset = 0usize;
    let mut best_correlation = 0.0f32;
    let mut found_good = false;
    let mut deepest = 1.0f32;
    // Correlation at offset - 1 and offset - 2.
    let mut last = 1.0f32;
    let mut before_last = 1.0f32;

    for offset in 0..half {
        let correlation = correlation_at(samples, offset, half);

        if correlation > GOOD_CORRELATION
            && correlation > last
            && clarity(correlation, deepest) >= MIN_CLARITY
        {
            found_good = true;
            if correlation > best_correlation {
                best_correlation = correlation;
                best_offset = offset;
            }
        } else if found_good {
            // Candidates form one rising run, so the peak is offset - 1.
            let shift = (correlation - before_last) / 2.0;
            let refined = best_offset as f32 + shift;
            if refined <= 0.0 {
                return PitchEstimate::unvoiced();
            }
            return PitchEstimate::voiced(sample_rate as f32 / refined);
        }

        if offset > 0 {
            deepest = deepest.min(correlation);
        }
        before_last = last;
        last = correlation;
    }

    if best_correlation > MIN_CORRELATION && best_offset > 0 {
        return PitchEstimate::voiced(sample_rate as f32 / best_offset as f32);
    }
    PitchEstimate::unvoiced()
}

/// Root-mean-square level of a block (0 for an empty block).
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    libm::sqrtf(sum / samples.len() as f32)
}

#[inline]
fn correlation_at(samples: &[f32], offset: usize, half: usize) -> f32 {
    let mut diff = 0.0f32;
    for i in 0..half {
        diff += libm::fabsf(samples[i] - samples[i + offset]);
    }
    1.0 - diff / half as f32
}

#[inline]
fn clarity(correlation: f32, deepest: f32) -> f32 {
    let depth = 1.0 - deepest;
    if depth <= 0.0 {
        return 0.0;
    }
    (correlation - deepest) / depth
}
