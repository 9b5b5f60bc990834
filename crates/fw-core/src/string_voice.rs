//! Parameters for a single plucked string.

/// Fret offset marking a muted (unplayed) string.
pub const MUTED_FRET: i8 = -1;

/// One string of a chord voicing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StringVoice {
    /// Pitch of the open string in Hz.
    pub open_string_frequency_hz: f32,
    /// Semitones above the open string; [`MUTED_FRET`] for a muted string.
    pub fret_offset: i8,
    /// Feedback gain of the delay line, in (0, 1). Closer to 1 sustains longer.
    pub decay: f32,
}

impl StringVoice {
    pub const fn new(open_string_frequency_hz: f32, fret_offset: i8, decay: f32) -> Self {
        Self {
            open_string_frequency_hz,
            fret_offset,
            decay,
        }
    }

    /// A muted string: produces no sound.
    pub const fn muted(open_string_frequency_hz: f32, decay: f32) -> Self {
        Self::new(open_string_frequency_hz, MUTED_FRET, decay)
    }

    /// True for a muted string. Offsets below -1 are treated as muted too.
    pub const fn is_muted(&self) -> bool {
        self.fret_offset <= MUTED_FRET
    }

    /// Sounding pitch: `open * 2^(fret / 12)`.
    pub fn effective_frequency(&self) -> f32 {
        self.open_string_frequency_hz * libm::powf(2.0, self.fret_offset as f32 / 12.0)
    }
}
