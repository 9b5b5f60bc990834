//! Result of running the pitch estimator over one block.

use crate::note::{cents_between, Note};

/// Fundamental-frequency estimate for a single block of samples.
///
/// `frequency_hz` is meaningless when `is_voiced` is false; the derived
/// accessors return `None` in that case.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PitchEstimate {
    /// Estimated fundamental in Hz.
    pub frequency_hz: f32,
    /// Whether the block held a discernible periodic pitch.
    pub is_voiced: bool,
}

impl PitchEstimate {
    /// Estimate for silence, noise, or anything without a confident peak.
    pub const fn unvoiced() -> Self {
        Self {
            frequency_hz: 0.0,
            is_voiced: false,
        }
    }

    /// A confident estimate. Non-finite or non-positive frequencies are
    /// reported as unvoiced.
    pub fn voiced(frequency_hz: f32) -> Self {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Self::unvoiced();
        }
        Self {
            frequency_hz,
            is_voiced: true,
        }
    }

    /// Nearest equal-tempered note.
    pub fn note(&self) -> Option<Note> {
        if !self.is_voiced {
            return None;
        }
        Note::from_frequency(self.frequency_hz)
    }

    /// Nearest MIDI note number.
    pub fn midi(&self) -> Option<i32> {
        self.note().map(Note::midi)
    }

    /// Deviation from the nearest note in cents, truncated toward zero.
    pub fn cents(&self) -> Option<i32> {
        self.note()
            .map(|note| cents_between(self.frequency_hz, note.midi()))
    }

    /// Frequency rounded to the nearest integer Hz for display (0 when unvoiced).
    pub fn display_frequency(&self) -> u32 {
        if !self.is_voiced {
            return 0;
        }
        libm::roundf(self.frequency_hz) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unvoiced_has_no_derived_values() {
        let estimate = PitchEstimate::unvoiced();
        assert!(estimate.note().is_none());
        assert!(estimate.cents().is_none());
        assert_eq!(estimate.display_frequency(), 0);
    }

    #[test]
    fn voiced_derives_note_and_cents() {
        let estimate = PitchEstimate::voiced(442.6);
        assert_eq!(estimate.midi(), Some(69));
        assert_eq!(estimate.note().unwrap().name(), "A");
        assert_eq!(estimate.cents(), Some(10));
        assert_eq!(estimate.display_frequency(), 443);
    }

    #[test]
    fn bogus_frequency_is_unvoiced() {
        assert!(!PitchEstimate::voiced(0.0).is_voiced);
        assert!(!PitchEstimate::voiced(f32::NAN).is_voiced);
    }
}
