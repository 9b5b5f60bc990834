//! Core data types for the fretwise audio engine.
//!
//! This crate defines the values passed between the engine stages:
//! captured and synthesized sample blocks, pitch estimates, string voices,
//! and the fixed guitar tables (tuning, chord shapes). The estimator,
//! synthesizer and scheduler in `fw-engine` consume these types.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chord;
mod note;
mod pitch_estimate;
mod sample_block;
mod scheduled_event;
mod signal_buffer;
mod string_voice;
pub mod tuning;

pub use chord::{find_chord, ChordShape, CHORD_LIBRARY};
pub use note::{
    cents_between, frequency_to_midi, midi_to_frequency, Note, A4_FREQUENCY, A4_MIDI, NOTE_NAMES,
};
pub use pitch_estimate::PitchEstimate;
pub use sample_block::SampleBlock;
pub use scheduled_event::ScheduledEvent;
pub use signal_buffer::SignalBuffer;
pub use string_voice::{StringVoice, MUTED_FRET};
pub use tuning::{
    closest_string, GuitarString, TuningStatus, IN_TUNE_CENTS, STANDARD_TUNING, STRING_COUNT,
    STRING_DECAY,
};
