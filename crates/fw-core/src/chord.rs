//! Named chord shapes for a six-string guitar in standard tuning.

use crate::string_voice::StringVoice;
use crate::tuning::{STANDARD_TUNING, STRING_COUNT};

/// A chord fingering: one fret offset per string, low E to high E.
/// `-1` marks a muted string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChordShape {
    /// Short lookup key, e.g. `"am"`.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    pub frets: [i8; STRING_COUNT],
}

impl ChordShape {
    /// Map the shape onto standard tuning and the per-string decay table.
    pub fn voices(&self) -> [StringVoice; STRING_COUNT] {
        core::array::from_fn(|i| {
            let string = &STANDARD_TUNING[i];
            StringVoice::new(string.frequency_hz, self.frets[i], string.decay)
        })
    }

    /// Number of strings that sound (not muted).
    pub fn sounding_strings(&self) -> usize {
        self.frets.iter().filter(|&&f| f >= 0).count()
    }
}

pub const CHORD_LIBRARY: [ChordShape; 10] = [
    ChordShape {
        id: "c",
        name: "C Major",
        frets: [-1, 3, 2, 0, 1, 0],
    },
    ChordShape {
        id: "g",
        name: "G Major",
        frets: [3, 2, 0, 0, 0, 3],
    },
    ChordShape {
        id: "d",
        name: "D Major",
        frets: [-1, -1, 0, 2, 3, 2],
    },
    ChordShape {
        id: "a",
        name: "A Major",
        frets: [-1, 0, 2, 2, 2, 0],
    },
    ChordShape {
        id: "e",
        name: "E Major",
        frets: [0, 2, 2, 1, 0, 0],
    },
    ChordShape {
        id: "am",
        name: "A Minor",
        frets: [-1, 0, 2, 2, 1, 0],
    },
    ChordShape {
        id: "em",
        name: "E Minor",
        frets: [0, 2, 2, 0, 0, 0],
    },
    ChordShape {
        id: "dm",
        name: "D Minor",
        frets: [-1, -1, 0, 2, 3, 1],
    },
    ChordShape {
        id: "f-easy",
        name: "F (Simplified)",
        frets: [-1, -1, 3, 2, 1, 1],
    },
    ChordShape {
        id: "f",
        name: "F Major",
        frets: [1, 3, 3, 2, 1, 1],
    },
];

/// Look up a chord by id or display name, ignoring ASCII case.
pub fn find_chord(name: &str) -> Option<&'static ChordShape> {
    let name = name.trim();
    CHORD_LIBRARY
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(name) || c.name.eq_ignore_ascii_case(name))
}
