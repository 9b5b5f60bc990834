//! Signal processing and timing engine for fretwise.
//!
//! Turns captured blocks into pitch estimates, plucked strings into sample
//! blocks, and tempo settings into sample-accurate event streams on the
//! output device clock.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod click;
mod event_queue;
mod metronome;
mod mixer;
pub mod pitch;
pub mod practice;
pub mod scheduler;
mod string_synth;
mod strum;

pub use click::{render_click, ClickConfig};
pub use event_queue::EventQueue;
pub use metronome::{clamp_bpm, Click, Metronome, MetronomeConfig, MAX_BPM, MIN_BPM};
pub use mixer::{Mixer, MixerCommand, MixerConfig, SharedBlock, MAX_VOICES};
pub use pitch::{estimate, estimate_samples};
pub use practice::{Feedback, MatchProgress, NoteMatcher};
pub use scheduler::{
    AudioClock, Interval, LookaheadScheduler, ManualTimer, SchedulerConfig, SchedulerState,
    WakeOutcome, WakeTimer,
};
#[cfg(feature = "std")]
pub use string_synth::pluck;
pub use string_synth::{
    period_samples, pluck_into, pluck_with_rng, PluckConfig, DEFAULT_PLUCK_SECONDS,
    MAX_PLUCK_SECONDS,
};
pub use strum::plan_strum;
