//! Lock-free plumbing between device callbacks and control threads.
//!
//! Capture: the input callback downmixes to mono and pushes into an SPSC
//! ring; the analysis side drains it into a `SignalBuffer`.
//!
//! Playback: control threads send `MixerCommand`s over per-producer SPSC
//! lanes. The render callback applies them, renders the mixer, publishes
//! the device clock, and sends finished buffers back on a retire ring so it
//! never frees memory itself.

use std::any::Any;
use std::fmt;

use fw_core::{ScheduledEvent, SignalBuffer};
use fw_engine::{Mixer, MixerCommand, MixerConfig, SharedBlock};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::clock::DeviceClock;

/// Commands a single lane can hold before `send` fails.
pub const LANE_CAPACITY: usize = 64;

/// Finished buffers awaiting release on the control side.
pub const RETIRE_CAPACITY: usize = 256;

/// Keeps a device stream alive. Dropping it stops the stream.
pub struct StreamGuard {
    inner: Option<Box<dyn Any>>,
    label: &'static str,
}

impl StreamGuard {
    pub fn new(stream: impl Any, label: &'static str) -> Self {
        Self {
            inner: Some(Box::new(stream)),
            label,
        }
    }

    /// A guard with nothing to release, for simulated devices.
    pub fn detached(label: &'static str) -> Self {
        Self { inner: None, label }
    }
}

impl fmt::Debug for StreamGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamGuard")
            .field("label", &self.label)
            .field("attached", &self.inner.is_some())
            .finish()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            tracing::debug!(stream = self.label, "released audio stream");
        }
    }
}

// ── Capture ──────────────────────────────────────────────────────

/// Device side of a capture ring.
pub struct CaptureWriter {
    producer: HeapProd<f32>,
}

impl CaptureWriter {
    /// Push interleaved device samples, averaging channels to mono.
    ///
    /// Samples that do not fit are dropped. Returns the frames written.
    pub fn write_interleaved(&mut self, data: &[f32], channels: usize) -> usize {
        if channels <= 1 {
            return self.producer.push_slice(data);
        }
        let scale = 1.0 / channels as f32;
        let mut written = 0;
        for frame in data.chunks_exact(channels) {
            let mono = frame.iter().sum::<f32>() * scale;
            if self.producer.try_push(mono).is_err() {
                break;
            }
            written += 1;
        }
        written
    }
}

/// Analysis side of a capture ring.
pub struct CaptureReader {
    consumer: HeapCons<f32>,
    sample_rate: u32,
}

impl CaptureReader {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples waiting to be read.
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Move everything captured so far into `buffer`. Returns the sample count.
    pub fn drain_into(&mut self, buffer: &mut SignalBuffer) -> usize {
        let mut scratch = [0.0f32; 512];
        let mut total = 0;
        loop {
            let n = self.consumer.pop_slice(&mut scratch);
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&scratch[..n]);
            total += n;
        }
        total
    }
}

/// Create a capture ring holding up to `capacity` mono samples.
pub fn capture_channel(capacity: usize, sample_rate: u32) -> (CaptureWriter, CaptureReader) {
    let (producer, consumer) = HeapRb::<f32>::new(capacity.max(1)).split();
    (
        CaptureWriter { producer },
        CaptureReader {
            consumer,
            sample_rate,
        },
    )
}

/// An open input device.
pub struct CaptureStream {
    reader: CaptureReader,
    guard: StreamGuard,
}

impl fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureStream")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl CaptureStream {
    pub fn new(reader: CaptureReader, guard: StreamGuard) -> Self {
        Self { reader, guard }
    }

    pub fn sample_rate(&self) -> u32 {
        self.reader.sample_rate
    }

    /// Separate the stream handle from the sample reader so the reader can
    /// move to an analysis thread.
    pub fn split(self) -> (StreamGuard, CaptureReader) {
        (self.guard, self.reader)
    }
}

// ── Playback ─────────────────────────────────────────────────────

/// Producer end of one mixer command lane.
pub struct OutputLane {
    producer: HeapProd<MixerCommand>,
}

impl OutputLane {
    /// Queue a command for the render callback. Hands it back if the lane is full.
    pub fn send(&mut self, command: MixerCommand) -> Result<(), MixerCommand> {
        self.producer.try_push(command)
    }

    /// Queue a buffer to sound at its target time.
    pub fn play(&mut self, event: ScheduledEvent<SharedBlock>) -> Result<(), MixerCommand> {
        self.send(MixerCommand::Play(event))
    }
}

/// Render-callback side of a playback stream.
pub struct RenderEnd {
    mixer: Mixer,
    lanes: [HeapCons<MixerCommand>; 2],
    retired: HeapProd<SharedBlock>,
    clock: DeviceClock,
}

impl RenderEnd {
    /// Fill one device buffer. Allocation-free.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let Self {
            mixer,
            lanes,
            retired,
            clock,
        } = self;
        // Dropping a buffer here only happens if the retire ring overflows.
        let mut retire = |block: SharedBlock| {
            let _ = retired.try_push(block);
        };

        for lane in lanes.iter_mut() {
            while let Some(command) = lane.try_pop() {
                mixer.apply(command, &mut retire);
            }
        }
        mixer.render(out, channels, &mut retire);
        clock.publish(mixer.frames_rendered());
    }

    pub fn clock(&self) -> &DeviceClock {
        &self.clock
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }
}

/// Control side of a playback stream, before it is bound to a device.
pub struct PlaybackHandle {
    control: OutputLane,
    metronome: OutputLane,
    retired: HeapCons<SharedBlock>,
    clock: DeviceClock,
}

/// Create the lanes, retire ring, clock and mixer for a playback stream.
pub fn playback_channel(config: MixerConfig, sample_rate: u32) -> (PlaybackHandle, RenderEnd) {
    let (control_prod, control_cons) = HeapRb::<MixerCommand>::new(LANE_CAPACITY).split();
    let (metronome_prod, metronome_cons) = HeapRb::<MixerCommand>::new(LANE_CAPACITY).split();
    let (retired_prod, retired_cons) = HeapRb::<SharedBlock>::new(RETIRE_CAPACITY).split();
    let clock = DeviceClock::new(sample_rate);

    let handle = PlaybackHandle {
        control: OutputLane {
            producer: control_prod,
        },
        metronome: OutputLane {
            producer: metronome_prod,
        },
        retired: retired_cons,
        clock: clock.clone(),
    };
    let render = RenderEnd {
        mixer: Mixer::new(config, sample_rate),
        lanes: [control_cons, metronome_cons],
        retired: retired_prod,
        clock,
    };
    (handle, render)
}

/// An open output device.
pub struct PlaybackStream {
    control: OutputLane,
    metronome: Option<OutputLane>,
    retired: HeapCons<SharedBlock>,
    clock: DeviceClock,
    _guard: StreamGuard,
}

impl fmt::Debug for PlaybackStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackStream")
            .field("guard", &self._guard)
            .finish_non_exhaustive()
    }
}

impl PlaybackStream {
    pub fn new(handle: PlaybackHandle, guard: StreamGuard) -> Self {
        Self {
            control: handle.control,
            metronome: Some(handle.metronome),
            retired: handle.retired,
            clock: handle.clock,
            _guard: guard,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    pub fn clock(&self) -> &DeviceClock {
        &self.clock
    }

    /// Queue a command on the control lane.
    pub fn send(&mut self, command: MixerCommand) -> Result<(), MixerCommand> {
        self.control.send(command)
    }

    pub fn play(&mut self, event: ScheduledEvent<SharedBlock>) -> Result<(), MixerCommand> {
        self.control.play(event)
    }

    /// Borrow the metronome lane for a worker thread.
    pub fn take_metronome_lane(&mut self) -> Option<OutputLane> {
        self.metronome.take()
    }

    pub fn restore_metronome_lane(&mut self, lane: OutputLane) {
        self.metronome = Some(lane);
    }

    /// Release buffers the render callback has finished with.
    pub fn collect_retired(&mut self) -> usize {
        let mut released = 0;
        while self.retired.try_pop().is_some() {
            released += 1;
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fw_core::SampleBlock;
    use fw_engine::AudioClock;
    use std::sync::Arc;

    #[test]
    fn capture_downmixes_to_mono() {
        let (mut writer, mut reader) = capture_channel(16, 8000);
        assert_eq!(writer.write_interleaved(&[1.0, 0.0, 0.5, 0.5, -1.0, -0.5], 2), 3);
        assert_eq!(reader.available(), 3);

        let mut buffer = SignalBuffer::new(4);
        assert_eq!(reader.drain_into(&mut buffer), 3);
        let mut out = [0.0f32; 3];
        buffer.snapshot_into(&mut out);
        assert_eq!(out, [0.5, 0.5, -0.75]);
    }

    #[test]
    fn capture_overflow_drops_newest() {
        let (mut writer, mut reader) = capture_channel(4, 8000);
        assert_eq!(writer.write_interleaved(&[0.1; 10], 1), 4);
        let mut buffer = SignalBuffer::new(8);
        assert_eq!(reader.drain_into(&mut buffer), 4);
        assert_eq!(reader.drain_into(&mut buffer), 0);
    }

    #[test]
    fn render_applies_commands_and_publishes_clock() {
        let (handle, mut render) = playback_channel(
            MixerConfig::default().with_gain(1.0).with_highpass(0.0),
            1000,
        );
        let mut stream = PlaybackStream::new(handle, StreamGuard::detached("test"));
        assert_eq!(stream.clock().now(), None);

        let block = Arc::new(SampleBlock::new(vec![0.5; 2], 1000));
        stream.play(ScheduledEvent::new(0.002, block)).unwrap();

        let mut out = [0.0f32; 8];
        render.render(&mut out, 2);
        assert_eq!(out, [0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 0.5]);
        assert_eq!(stream.clock().now(), Some(0.004));
        assert_eq!(stream.collect_retired(), 1);

        render.render(&mut out, 2);
        assert_eq!(out, [0.0; 8]);
        assert_eq!(stream.clock().frames(), Some(8));
    }

    #[test]
    fn finished_buffers_come_back() {
        let (handle, mut render) = playback_channel(
            MixerConfig::default().with_gain(1.0).with_highpass(0.0),
            1000,
        );
        let mut stream = PlaybackStream::new(handle, StreamGuard::detached("test"));
        let block = Arc::new(SampleBlock::new(vec![0.25; 3], 1000));

        let mut lane = stream.take_metronome_lane().unwrap();
        assert!(stream.take_metronome_lane().is_none());
        lane.play(ScheduledEvent::new(0.0, block.clone())).unwrap();
        stream.restore_metronome_lane(lane);

        let mut out = [0.0f32; 4];
        render.render(&mut out, 1);
        assert_eq!(out, [0.25, 0.25, 0.25, 0.0]);
        assert_eq!(Arc::strong_count(&block), 2);
        assert_eq!(stream.collect_retired(), 1);
        assert_eq!(Arc::strong_count(&block), 1);
    }

    #[test]
    fn full_lane_hands_command_back() {
        let (handle, _render) = playback_channel(MixerConfig::default(), 1000);
        let mut stream = PlaybackStream::new(handle, StreamGuard::detached("test"));
        for _ in 0..LANE_CAPACITY {
            stream.send(MixerCommand::StopAll).unwrap();
        }
        assert!(stream.send(MixerCommand::StopAll).is_err());
    }
}
