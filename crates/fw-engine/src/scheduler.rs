//! Look-ahead event scheduling against the output device clock.
//!
//! A coarse wake-up timer calls [`LookaheadScheduler::on_wake`] every
//! `lookahead` (25 ms by default). Each wake-up emits every event whose
//! target time falls inside `[now, now + schedule_ahead)`, timestamped on
//! the device clock. How late the wake-up itself runs does not matter as
//! long as it runs at least once per window; the emitted target times are
//! exact regardless.
//!
//! Target times are derived from an anchor rather than accumulated:
//!
//! ```text
//! time(k) = anchor_time + (k - anchor_index) * seconds_per_event
//! ```
//!
//! so a run of thousands of events carries no floating-point drift. A rate
//! change re-anchors at the pending event, leaving it (and everything
//! already emitted) where it was.

use core::time::Duration;

use fw_core::ScheduledEvent;

/// Device playback clock, in seconds.
pub trait AudioClock {
    /// Current playback position, or `None` until the device has started.
    fn now(&self) -> Option<f64>;
}

impl<C: AudioClock + ?Sized> AudioClock for &C {
    fn now(&self) -> Option<f64> {
        (**self).now()
    }
}

/// Recurring wake-up source driving a scheduler.
pub trait WakeTimer {
    /// Begin firing every `interval`.
    fn arm(&mut self, interval: Duration);
    /// Stop firing.
    fn disarm(&mut self);
}

/// A timer that only records what it was asked to do.
///
/// Used when the caller drives `on_wake` itself, e.g. from a simulation loop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManualTimer {
    interval: Option<Duration>,
    arm_count: u32,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Number of times the timer has been armed.
    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }
}

impl WakeTimer for ManualTimer {
    fn arm(&mut self, interval: Duration) {
        self.interval = Some(interval);
        self.arm_count += 1;
    }

    fn disarm(&mut self) {
        self.interval = None;
    }
}

/// Nominal event rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interval {
    /// Beats per minute.
    Bpm(f64),
    /// Fixed delay between events.
    Seconds(f64),
}

impl Interval {
    /// Seconds between events, or `None` if the rate is not positive and finite.
    pub fn seconds(self) -> Option<f64> {
        let seconds = match self {
            Interval::Bpm(bpm) => 60.0 / bpm,
            Interval::Seconds(s) => s,
        };
        if seconds.is_finite() && seconds > 0.0 {
            Some(seconds)
        } else {
            None
        }
    }
}

/// Timing parameters for look-ahead scheduling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// How often the wake-up timer fires.
    pub lookahead: Duration,
    /// How far past the device clock events are emitted, in seconds.
    pub schedule_ahead: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead: Duration::from_millis(25),
            schedule_ahead: 0.1,
        }
    }
}

impl SchedulerConfig {
    pub fn with_lookahead(mut self, lookahead: Duration) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn with_schedule_ahead(mut self, seconds: f64) -> Self {
        self.schedule_ahead = seconds;
        self
    }
}

/// Observable scheduler state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerState {
    pub next_event_time: f64,
    pub is_running: bool,
}

/// What a single wake-up did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WakeOutcome {
    pub emitted: usize,
    /// Beats dropped because their target time had already passed.
    pub skipped: u64,
}

/// Upper bound on events emitted by one wake-up.
pub const MAX_EVENTS_PER_WAKE: usize = 64;

/// Look-ahead scheduler for a recurring event stream.
///
/// Emits `ScheduledEvent<u64>` whose payload is the event index, counting
/// from 0 at `start`.
#[derive(Debug)]
pub struct LookaheadScheduler<T: WakeTimer> {
    config: SchedulerConfig,
    timer: T,
    seconds_per_event: f64,
    anchor_time: f64,
    anchor_index: u64,
    next_index: u64,
    running: bool,
}

impl<T: WakeTimer> LookaheadScheduler<T> {
    /// Create an idle scheduler. Invalid intervals fall back to one event per second.
    pub fn new(config: SchedulerConfig, interval: Interval, timer: T) -> Self {
        Self {
            config,
            timer,
            seconds_per_event: interval.seconds().unwrap_or(1.0),
            anchor_time: 0.0,
            anchor_index: 0,
            next_index: 0,
            running: false,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn seconds_per_event(&self) -> f64 {
        self.seconds_per_event
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Index of the next event to be emitted.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn next_event_time(&self) -> f64 {
        self.time_of(self.next_index)
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            next_event_time: self.next_event_time(),
            is_running: self.running,
        }
    }

    fn time_of(&self, index: u64) -> f64 {
        self.anchor_time + (index - self.anchor_index) as f64 * self.seconds_per_event
    }

    /// Idle → Running with the first event at `start_time`.
    ///
    /// Returns `false` without touching the timer if already running.
    pub fn start(&mut self, start_time: f64) -> bool {
        if self.running {
            return false;
        }
        self.anchor_time = start_time;
        self.anchor_index = 0;
        self.next_index = 0;
        self.running = true;
        self.timer.arm(self.config.lookahead);
        true
    }

    /// Running → Idle. Returns `false` if already idle.
    ///
    /// Events already emitted are not retracted.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.timer.disarm();
        true
    }

    /// Change the event rate.
    ///
    /// The pending event keeps its target time; the new spacing applies from
    /// the interval after it. Returns `false` and keeps the old rate if
    /// `interval` is invalid.
    pub fn set_interval(&mut self, interval: Interval) -> bool {
        let Some(seconds) = interval.seconds() else {
            return false;
        };
        self.anchor_time = self.next_event_time();
        self.anchor_index = self.next_index;
        self.seconds_per_event = seconds;
        true
    }

    /// Timer callback: emit every due event in time order.
    ///
    /// Does nothing while idle or while the clock is unavailable. Beats whose
    /// target time has already passed are skipped, not emitted late.
    pub fn on_wake<C, F>(&mut self, clock: &C, mut emit: F) -> WakeOutcome
    where
        C: AudioClock + ?Sized,
        F: FnMut(ScheduledEvent<u64>),
    {
        let mut outcome = WakeOutcome::default();
        if !self.running {
            return outcome;
        }
        let Some(now) = clock.now() else {
            return outcome;
        };

        if self.next_event_time() < now {
            let first_due = self.first_index_at_or_after(now);
            outcome.skipped = first_due - self.next_index;
            self.next_index = first_due;
        }

        let horizon = now + self.config.schedule_ahead;
        while outcome.emitted < MAX_EVENTS_PER_WAKE {
            let target = self.next_event_time();
            if target >= horizon {
                break;
            }
            emit(ScheduledEvent::new(target, self.next_index));
            self.next_index += 1;
            outcome.emitted += 1;
        }
        outcome
    }

    fn first_index_at_or_after(&self, now: f64) -> u64 {
        let elapsed = (now - self.anchor_time) / self.seconds_per_event;
        let mut index = self.anchor_index + libm::ceil(elapsed).max(0.0) as u64;
        while self.time_of(index) < now {
            index += 1;
        }
        while index > self.next_index && self.time_of(index - 1) >= now {
            index -= 1;
        }
        index.max(self.next_index)
    }
}
