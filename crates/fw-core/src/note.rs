//! Equal-tempered note math.
//!
//! Frequencies map to MIDI note numbers relative to A4 = 440 Hz. Note names
//! come from a fixed 12-entry chromatic table starting at C.

use arrayvec::ArrayString;
use core::fmt;
use core::fmt::Write;

/// Reference frequency of A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

/// Chromatic note names, indexed by `midi mod 12`.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Fractional MIDI note number for a frequency: `69 + 12 * log2(f / 440)`.
pub fn frequency_to_midi(frequency_hz: f32) -> f32 {
    A4_MIDI as f32 + 12.0 * libm::log2f(frequency_hz / A4_FREQUENCY)
}

/// Equal-tempered frequency of a MIDI note.
pub fn midi_to_frequency(midi: i32) -> f32 {
    A4_FREQUENCY * libm::powf(2.0, (midi - A4_MIDI) as f32 / 12.0)
}

/// Deviation of `frequency_hz` from the equal-tempered pitch of `midi`,
/// in cents, truncated toward zero.
pub fn cents_between(frequency_hz: f32, midi: i32) -> i32 {
    let reference = midi_to_frequency(midi);
    libm::truncf(1200.0 * libm::log2f(frequency_hz / reference)) as i32
}

/// A note on the equal-tempered chromatic scale, identified by MIDI number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Note {
    midi: i32,
}

impl Note {
    /// Create a note from its MIDI number.
    pub const fn from_midi(midi: i32) -> Self {
        Self { midi }
    }

    /// Nearest note to a frequency. `None` for zero, negative or non-finite input.
    pub fn from_frequency(frequency_hz: f32) -> Option<Self> {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return None;
        }
        let midi = libm::roundf(frequency_to_midi(frequency_hz));
        Some(Self { midi: midi as i32 })
    }

    /// MIDI note number.
    pub const fn midi(self) -> i32 {
        self.midi
    }

    /// Index into [`NOTE_NAMES`] (0 = C).
    pub const fn pitch_class(self) -> usize {
        self.midi.rem_euclid(12) as usize
    }

    /// Note name without octave, e.g. `"C#"`.
    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.pitch_class()]
    }

    /// Scientific pitch octave (MIDI 60 = C4).
    pub const fn octave(self) -> i32 {
        self.midi.div_euclid(12) - 1
    }

    /// Equal-tempered frequency of this note.
    pub fn frequency(self) -> f32 {
        midi_to_frequency(self.midi)
    }

    /// Name with octave as a fixed-capacity string, e.g. `"A4"`.
    pub fn label(self) -> ArrayString<8> {
        let mut label = ArrayString::new();
        let _ = write!(label, "{}", self);
        label
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave())
    }
}
