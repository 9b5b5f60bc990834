//! Output mixer driven by the device render callback.
//!
//! Scheduled voices start at the exact output frame `round(target * rate)`.
//! The mix is summed, passed through a one-pole highpass to cut sub-audible
//! body boom, scaled by the master gain, clamped to [-1, 1], and copied to
//! every device channel.
//!
//! All storage is fixed-capacity so `render` never allocates. Finished
//! voices are handed to a `retire` callback instead of being dropped, so the
//! caller can move the last reference off the audio thread.

use alloc::sync::Arc;
use core::f32::consts::TAU;

use fw_core::{SampleBlock, ScheduledEvent};
use heapless::Vec;

use crate::event_queue::EventQueue;

/// A rendered buffer shared between the control side and the mixer.
pub type SharedBlock = Arc<SampleBlock>;

/// Maximum number of voices pending or sounding at once.
pub const MAX_VOICES: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixerConfig {
    pub master_gain: f32,
    /// Highpass corner frequency; zero or below disables the filter.
    pub highpass_hz: f32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            master_gain: 0.5,
            highpass_hz: 60.0,
        }
    }
}

impl MixerConfig {
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain;
        self
    }

    pub fn with_highpass(mut self, hz: f32) -> Self {
        self.highpass_hz = hz;
        self
    }
}

/// Control message for the render side.
#[derive(Clone, Debug)]
pub enum MixerCommand {
    /// Sound a buffer at its target time.
    Play(ScheduledEvent<SharedBlock>),
    /// Silence everything pending or sounding.
    StopAll,
}

#[derive(Clone, Copy, Debug)]
struct OnePoleHighpass {
    alpha: f32,
    prev_in: f32,
    prev_out: f32,
}

impl OnePoleHighpass {
    fn new(cutoff_hz: f32, sample_rate: u32) -> Option<Self> {
        if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || sample_rate == 0 {
            return None;
        }
        let rc = 1.0 / (TAU * cutoff_hz);
        let dt = 1.0 / sample_rate as f32;
        Some(Self {
            alpha: rc / (rc + dt),
            prev_in: 0.0,
            prev_out: 0.0,
        })
    }

    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        let y = self.alpha * (self.prev_out + x - self.prev_in);
        self.prev_in = x;
        self.prev_out = y;
        y
    }
}

#[derive(Debug)]
struct ActiveVoice {
    block: SharedBlock,
    position: usize,
}

/// Sample-accurate voice mixer.
#[derive(Debug)]
pub struct Mixer {
    sample_rate: u32,
    master_gain: f32,
    highpass: Option<OnePoleHighpass>,
    pending: EventQueue<SharedBlock, MAX_VOICES>,
    active: Vec<ActiveVoice, MAX_VOICES>,
    frames_rendered: u64,
}

impl Mixer {
    pub fn new(config: MixerConfig, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            master_gain: config.master_gain,
            highpass: OnePoleHighpass::new(config.highpass_hz, sample_rate),
            pending: EventQueue::new(),
            active: Vec::new(),
            frames_rendered: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames rendered since creation.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Output position in seconds.
    pub fn now(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    /// Voices waiting for their start frame.
    pub fn pending_voices(&self) -> usize {
        self.pending.len()
    }

    /// Pending voices in start order.
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledEvent<SharedBlock>> {
        self.pending.iter()
    }

    /// Voices currently sounding.
    pub fn active_voices(&self) -> usize {
        self.active.len()
    }

    /// Queue a buffer to start at its target time. Hands it back if full.
    pub fn schedule(&mut self, event: ScheduledEvent<SharedBlock>) -> Result<(), SharedBlock> {
        if self.pending.len() + self.active.len() >= MAX_VOICES {
            return Err(event.payload);
        }
        self.pending.push(event).map_err(|e| e.payload)
    }

    /// Apply a control message. Rejected or silenced buffers go to `retire`.
    pub fn apply(&mut self, command: MixerCommand, mut retire: impl FnMut(SharedBlock)) {
        match command {
            MixerCommand::Play(event) => {
                if let Err(block) = self.schedule(event) {
                    retire(block);
                }
            }
            MixerCommand::StopAll => self.clear(retire),
        }
    }

    /// Drop every pending and sounding voice.
    pub fn clear(&mut self, mut retire: impl FnMut(SharedBlock)) {
        self.pending.drain_with(|event| retire(event.payload));
        while let Some(voice) = self.active.pop() {
            retire(voice.block);
        }
    }

    fn start_frame(&self, target_time: f64) -> u64 {
        let frame = libm::round(target_time * self.sample_rate as f64);
        if frame.is_finite() && frame > 0.0 {
            frame as u64
        } else {
            0
        }
    }

    /// Render interleaved output for `channels` channels.
    ///
    /// Every channel of a frame receives the same mono mix. Finished voices
    /// are passed to `retire`.
    pub fn render(&mut self, out: &mut [f32], channels: usize, mut retire: impl FnMut(SharedBlock)) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let frame_index = self.frames_rendered;

            while let Some(next) = self.pending.peek() {
                if self.start_frame(next.target_time) > frame_index {
                    break;
                }
                let Some(event) = self.pending.pop() else {
                    break;
                };
                if let Err(voice) = self.active.push(ActiveVoice {
                    block: event.payload,
                    position: 0,
                }) {
                    retire(voice.block);
                }
            }

            let mut mix = 0.0f32;
            let mut i = 0;
            while i < self.active.len() {
                let voice = &mut self.active[i];
                let samples = voice.block.samples();
                if voice.position < samples.len() {
                    mix += samples[voice.position];
                    voice.position += 1;
                }
                if voice.position >= samples.len() {
                    retire(self.active.swap_remove(i).block);
                } else {
                    i += 1;
                }
            }

            if let Some(filter) = self.highpass.as_mut() {
                mix = filter.process(mix);
            }
            let value = (mix * self.master_gain).clamp(-1.0, 1.0);
            frame.fill(value);

            self.frames_rendered += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec as StdVec;

    fn flat() -> MixerConfig {
        MixerConfig::default().with_gain(1.0).with_highpass(0.0)
    }

    fn block(samples: &[f32]) -> SharedBlock {
        Arc::new(SampleBlock::new(samples.to_vec(), 1000))
    }

    #[test]
    fn voice_starts_on_exact_frame() {
        let mut mixer = Mixer::new(flat(), 1000);
        mixer.schedule(ScheduledEvent::new(0.010, block(&[1.0; 4]))).unwrap();

        let mut out = vec![0.0f32; 20];
        mixer.render(&mut out, 1, |_| {});
        assert!(out[..10].iter().all(|&s| s == 0.0));
        assert_eq!(&out[10..14], &[1.0; 4]);
        assert!(out[14..].iter().all(|&s| s == 0.0));
        assert_eq!(mixer.frames_rendered(), 20);
        assert_eq!(mixer.now(), 0.02);
    }

    #[test]
    fn start_spans_callback_boundary() {
        let mut mixer = Mixer::new(flat(), 1000);
        mixer.schedule(ScheduledEvent::new(0.006, block(&[0.5; 2]))).unwrap();

        let mut first = [0.0f32; 4];
        let mut second = [0.0f32; 4];
        mixer.render(&mut first, 1, |_| {});
        mixer.render(&mut second, 1, |_| {});
        assert_eq!(first, [0.0; 4]);
        assert_eq!(second, [0.0, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn past_targets_start_immediately() {
        let mut mixer = Mixer::new(flat(), 1000);
        let mut out = [0.0f32; 8];
        mixer.render(&mut out, 1, |_| {});
        mixer.schedule(ScheduledEvent::new(0.001, block(&[0.25]))).unwrap();
        mixer.render(&mut out, 1, |_| {});
        assert_eq!(out[0], 0.25);
    }

    #[test]
    fn voices_sum_and_clamp() {
        let mut mixer = Mixer::new(flat(), 1000);
        mixer.schedule(ScheduledEvent::new(0.0, block(&[0.25, 0.8]))).unwrap();
        mixer.schedule(ScheduledEvent::new(0.0, block(&[0.25, 0.8]))).unwrap();
        let mut out = [0.0f32; 2];
        mixer.render(&mut out, 1, |_| {});
        assert_eq!(out, [0.5, 1.0]);
    }

    #[test]
    fn every_channel_gets_the_mix() {
        let mut mixer = Mixer::new(flat(), 1000);
        mixer.schedule(ScheduledEvent::new(0.0, block(&[0.1, 0.2]))).unwrap();
        let mut out = [0.0f32; 6];
        mixer.render(&mut out, 2, |_| {});
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.0, 0.0]);
        assert_eq!(mixer.frames_rendered(), 3);
    }

    #[test]
    fn finished_voices_are_retired() {
        let mut mixer = Mixer::new(flat(), 1000);
        let shared = block(&[0.1; 3]);
        mixer.schedule(ScheduledEvent::new(0.0, shared.clone())).unwrap();

        let mut retired = StdVec::new();
        let mut out = [0.0f32; 2];
        mixer.render(&mut out, 1, |b| retired.push(b));
        assert!(retired.is_empty());
        assert_eq!(mixer.active_voices(), 1);

        mixer.render(&mut out, 1, |b| retired.push(b));
        assert_eq!(retired.len(), 1);
        assert!(Arc::ptr_eq(&retired[0], &shared));
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut mixer = Mixer::new(flat(), 1000);
        for _ in 0..MAX_VOICES {
            mixer.schedule(ScheduledEvent::new(1.0, block(&[0.0]))).unwrap();
        }
        assert!(mixer.schedule(ScheduledEvent::new(1.0, block(&[0.0]))).is_err());

        let mut retired = 0;
        mixer.apply(MixerCommand::Play(ScheduledEvent::new(1.0, block(&[0.0]))), |_| retired += 1);
        assert_eq!(retired, 1);
    }

    #[test]
    fn stop_all_retires_everything() {
        let mut mixer = Mixer::new(flat(), 1000);
        mixer.schedule(ScheduledEvent::new(0.0, block(&[0.1; 100]))).unwrap();
        mixer.schedule(ScheduledEvent::new(5.0, block(&[0.1; 100]))).unwrap();
        let mut out = [0.0f32; 4];
        mixer.render(&mut out, 1, |_| {});

        let mut retired = 0;
        mixer.apply(MixerCommand::StopAll, |_| retired += 1);
        assert_eq!(retired, 2);
        assert_eq!(mixer.pending_voices() + mixer.active_voices(), 0);
    }

    #[test]
    fn highpass_removes_dc() {
        let mut mixer = Mixer::new(MixerConfig::default().with_gain(1.0), 44100);
        mixer.schedule(ScheduledEvent::new(0.0, Arc::new(SampleBlock::new(vec![0.5; 44100], 44100)))).unwrap();
        let mut out = vec![0.0f32; 44100];
        mixer.render(&mut out, 1, |_| {});
        assert!(out[0] > 0.4);
        assert!(out[22050..].iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn master_gain_scales() {
        let mut mixer = Mixer::new(flat().with_gain(0.5), 1000);
        mixer.schedule(ScheduledEvent::new(0.0, block(&[0.8]))).unwrap();
        let mut out = [0.0f32; 1];
        mixer.render(&mut out, 1, |_| {});
        assert_eq!(out[0], 0.4);
    }
}
