//! Mono f32 sample block tagged with its sample rate.

use alloc::vec;
use alloc::vec::Vec;

/// An ordered run of mono samples in [-1, 1] captured or generated at
/// `sample_rate` Hz.
///
/// A block is owned by whichever stage produced it and is handed on by
/// value or borrow; nothing mutates it after handoff.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBlock {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBlock {
    /// Wrap existing samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A block of `len` zero samples.
    pub fn silent(len: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; len],
            sample_rate,
        }
    }

    /// A zero-length block. Does not allocate.
    pub const fn empty(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the block holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Read-only access to the samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Length in seconds (0 for a zero sample rate).
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(libm::fabsf(*s)))
    }

    /// True if every sample is exactly zero (or the block is empty).
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}

impl AsRef<[f32]> for SampleBlock {
    fn as_ref(&self) -> &[f32] {
        &self.samples
    }
}
