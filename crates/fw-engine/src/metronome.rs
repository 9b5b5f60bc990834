//! Click-train mode of the look-ahead scheduler.

use fw_core::ScheduledEvent;

use crate::click::ClickConfig;
use crate::scheduler::{
    AudioClock, Interval, LookaheadScheduler, SchedulerConfig, SchedulerState, WakeOutcome,
    WakeTimer,
};

pub const MIN_BPM: u32 = 30;
pub const MAX_BPM: u32 = 300;

/// One metronome beat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Click {
    /// Beat index since the metronome started.
    pub beat: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetronomeConfig {
    pub scheduler: SchedulerConfig,
    /// Delay between `start` and the first click, covering setup latency.
    pub start_delay: f64,
    pub initial_bpm: u32,
    pub click: ClickConfig,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            start_delay: 0.05,
            initial_bpm: 60,
            click: ClickConfig::default(),
        }
    }
}

impl MetronomeConfig {
    pub fn with_start_delay(mut self, seconds: f64) -> Self {
        self.start_delay = seconds;
        self
    }

    pub fn with_bpm(mut self, bpm: u32) -> Self {
        self.initial_bpm = bpm;
        self
    }
}

/// Clamp a tempo into the supported range.
pub fn clamp_bpm(bpm: u32) -> u32 {
    bpm.clamp(MIN_BPM, MAX_BPM)
}

/// A metronome: fixed-tempo click events on the device clock.
#[derive(Debug)]
pub struct Metronome<T: WakeTimer> {
    scheduler: LookaheadScheduler<T>,
    bpm: u32,
    start_delay: f64,
}

impl<T: WakeTimer> Metronome<T> {
    pub fn new(config: MetronomeConfig, timer: T) -> Self {
        let bpm = clamp_bpm(config.initial_bpm);
        Self {
            scheduler: LookaheadScheduler::new(config.scheduler, Interval::Bpm(bpm as f64), timer),
            bpm,
            start_delay: config.start_delay,
        }
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &LookaheadScheduler<T> {
        &self.scheduler
    }

    pub fn timer_mut(&mut self) -> &mut T {
        self.scheduler.timer_mut()
    }

    /// Set the tempo, clamped to `[MIN_BPM, MAX_BPM]`. Returns the tempo applied.
    ///
    /// While running, the change takes effect after the pending click.
    pub fn set_rate(&mut self, bpm: u32) -> u32 {
        let bpm = clamp_bpm(bpm);
        if bpm != self.bpm {
            self.bpm = bpm;
            self.scheduler.set_interval(Interval::Bpm(bpm as f64));
        }
        bpm
    }

    /// Start clicking `start_delay` after the current device time.
    ///
    /// A device that has not started yet counts as time zero. Returns `false`
    /// if already running.
    pub fn start<C: AudioClock + ?Sized>(&mut self, clock: &C) -> bool {
        let now = clock.now().unwrap_or(0.0);
        self.scheduler.start(now + self.start_delay)
    }

    pub fn stop(&mut self) -> bool {
        self.scheduler.stop()
    }

    /// Timer callback; see [`LookaheadScheduler::on_wake`].
    pub fn on_wake<C, F>(&mut self, clock: &C, mut emit: F) -> WakeOutcome
    where
        C: AudioClock + ?Sized,
        F: FnMut(ScheduledEvent<Click>),
    {
        self.scheduler
            .on_wake(clock, |event| emit(event.map(|beat| Click { beat })))
    }
}
