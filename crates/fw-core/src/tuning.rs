//! Standard six-string guitar tuning and tuner status.

use crate::note::Note;

/// Number of strings on the instrument.
pub const STRING_COUNT: usize = 6;

/// Delay-line feedback per string, low E to high E. Thicker strings sustain longer.
pub const STRING_DECAY: [f32; STRING_COUNT] = [0.996, 0.995, 0.994, 0.993, 0.992, 0.991];

/// Cents window inside which a string counts as in tune.
pub const IN_TUNE_CENTS: i32 = 5;

/// An open string of the instrument.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuitarString {
    /// Open-string note.
    pub note: Note,
    /// Open-string frequency in Hz.
    pub frequency_hz: f32,
    /// Synthesis decay for this string.
    pub decay: f32,
}

/// Standard tuning E2 A2 D3 G3 B3 E4, low to high.
pub const STANDARD_TUNING: [GuitarString; STRING_COUNT] = [
    GuitarString {
        note: Note::from_midi(40),
        frequency_hz: 82.41,
        decay: STRING_DECAY[0],
    },
    GuitarString {
        note: Note::from_midi(45),
        frequency_hz: 110.00,
        decay: STRING_DECAY[1],
    },
    GuitarString {
        note: Note::from_midi(50),
        frequency_hz: 146.83,
        decay: STRING_DECAY[2],
    },
    GuitarString {
        note: Note::from_midi(55),
        frequency_hz: 196.00,
        decay: STRING_DECAY[3],
    },
    GuitarString {
        note: Note::from_midi(59),
        frequency_hz: 246.94,
        decay: STRING_DECAY[4],
    },
    GuitarString {
        note: Note::from_midi(64),
        frequency_hz: 329.63,
        decay: STRING_DECAY[5],
    },
];

/// Index of the open string closest in pitch to `frequency_hz`.
///
/// Distance is measured in semitones so the comparison is fair across the
/// whole neck. Returns `None` for non-positive or non-finite input.
pub fn closest_string(frequency_hz: f32) -> Option<usize> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }
    let target = crate::note::frequency_to_midi(frequency_hz);
    let mut best = 0;
    let mut best_distance = f32::MAX;
    for (i, string) in STANDARD_TUNING.iter().enumerate() {
        let distance = libm::fabsf(crate::note::frequency_to_midi(string.frequency_hz) - target);
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    Some(best)
}

/// Tuner readout for a cents deviation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TuningStatus {
    InTune,
    Flat,
    Sharp,
}

impl TuningStatus {
    pub fn from_cents(cents: i32) -> Self {
        if cents.abs() < IN_TUNE_CENTS {
            TuningStatus::InTune
        } else if cents < 0 {
            TuningStatus::Flat
        } else {
            TuningStatus::Sharp
        }
    }
}
