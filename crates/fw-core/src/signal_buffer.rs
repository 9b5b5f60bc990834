//! Fixed-size rolling capture of the most recent input samples.

use alloc::vec;
use alloc::vec::Vec;

use crate::sample_block::SampleBlock;

/// Ring of the last `capacity` samples from a live input.
#[derive(Clone, Debug)]
pub struct SignalBuffer {
    data: Vec<f32>,
    /// Next write position.
    write: usize,
    /// Samples written so far, saturating at capacity.
    filled: usize,
}

impl SignalBuffer {
    /// Create a zeroed buffer holding `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity],
            write: 0,
            filled: 0,
        }
    }

    /// Number of samples the buffer holds.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// True once `capacity` samples have been written.
    pub fn is_full(&self) -> bool {
        self.filled == self.data.len()
    }

    /// Append one sample, overwriting the oldest.
    pub fn push(&mut self, sample: f32) {
        if self.data.is_empty() {
            return;
        }
        self.data[self.write] = sample;
        self.write = (self.write + 1) % self.data.len();
        self.filled = (self.filled + 1).min(self.data.len());
    }

    /// Append a run of samples.
    pub fn extend_from_slice(&mut self, samples: &[f32]) {
        for &s in samples {
            self.push(s);
        }
    }

    /// Copy the contents, oldest first, into `out`.
    ///
    /// If `out` is shorter than the capacity only the newest samples are
    /// copied; if longer, the tail of `out` is left untouched.
    pub fn snapshot_into(&self, out: &mut [f32]) {
        let cap = self.data.len();
        let n = out.len().min(cap);
        let start = (self.write + cap - n) % cap.max(1);
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            *slot = self.data[(start + i) % cap];
        }
    }

    /// Copy the contents, oldest first, into a new block.
    pub fn to_block(&self, sample_rate: u32) -> SampleBlock {
        let mut samples = vec![0.0; self.data.len()];
        self.snapshot_into(&mut samples);
        SampleBlock::new(samples, sample_rate)
    }

    /// Zero the buffer.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.write = 0;
        self.filled = 0;
    }
}
