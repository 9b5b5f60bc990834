//! Chord strums: one pluck per sounding string, staggered low to high.

use alloc::vec::Vec;

use fw_core::{SampleBlock, ScheduledEvent, StringVoice};
use rand::Rng;

use crate::string_synth::{pluck_with_rng, PluckConfig};

/// Render and time-offset every sounding string of a chord.
///
/// The k-th sounding string (muted strings are skipped and do not take a
/// slot) starts at `start_time + k * strum_delay`. A negative or non-finite
/// delay is treated as zero, giving a simultaneous strike.
pub fn plan_strum<R: Rng + ?Sized>(
    voices: &[StringVoice],
    start_time: f64,
    strum_delay: f64,
    pluck: &PluckConfig,
    sample_rate: u32,
    rng: &mut R,
) -> Vec<ScheduledEvent<SampleBlock>> {
    let delay = if strum_delay.is_finite() {
        strum_delay.max(0.0)
    } else {
        0.0
    };
    voices
        .iter()
        .filter(|voice| !voice.is_muted())
        .enumerate()
        .map(|(k, voice)| {
            let block = pluck_with_rng(voice, pluck.duration_seconds, sample_rate, rng);
            ScheduledEvent::new(start_time + k as f64 * delay, block)
        })
        .collect()
}
