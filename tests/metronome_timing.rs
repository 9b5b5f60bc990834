//! Metronome timing against a simulated device clock.
//!
//! The wake-up loop is driven by hand at the default 25 ms cadence, with
//! and without jitter, and every emitted click is checked against the exact
//! beat grid. One test runs the real session worker against a simulated
//! output device instead.

use std::cell::Cell;
use std::thread;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use fw_audio::SimBackend;
use fw_core::ScheduledEvent;
use fw_engine::{AudioClock, Click, ManualTimer, Metronome, MetronomeConfig};
use fw_session::{Session, SessionConfig};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const TICK: f64 = 0.025;
const SAMPLE_RATE: u32 = 8000;

struct SimClock(Cell<Option<f64>>);

impl SimClock {
    fn at(t: f64) -> Self {
        Self(Cell::new(Some(t)))
    }
}

impl AudioClock for SimClock {
    fn now(&self) -> Option<f64> {
        self.0.get()
    }
}

fn metronome(bpm: u32) -> Metronome<ManualTimer> {
    Metronome::new(
        MetronomeConfig::default().with_bpm(bpm).with_start_delay(0.0),
        ManualTimer::new(),
    )
}

/// Wake at every tick in `[from, until]`, collecting emitted clicks.
fn run(
    m: &mut Metronome<ManualTimer>,
    clock: &SimClock,
    from: f64,
    until: f64,
) -> Vec<ScheduledEvent<Click>> {
    let mut clicks = Vec::new();
    let first = (from / TICK).round() as u64;
    let last = (until / TICK).round() as u64;
    for k in first..=last {
        clock.0.set(Some(k as f64 * TICK));
        m.on_wake(clock, |event| clicks.push(event));
    }
    clicks
}

#[test]
fn sixty_bpm_for_five_seconds() {
    let clock = SimClock::at(0.0);
    let mut m = metronome(60);
    assert!(m.start(&clock));
    assert!(m.timer_mut().is_armed());

    let clicks = run(&mut m, &clock, 0.0, 5.0);
    let before_five: Vec<f64> = clicks
        .iter()
        .map(|c| c.target_time)
        .filter(|t| *t < 5.0)
        .collect();

    assert_eq!(before_five.len(), 5);
    for (k, t) in before_five.iter().enumerate() {
        assert_abs_diff_eq!(*t, k as f64, epsilon = 1e-12);
    }
    // The look-ahead window at t = 5.0 also holds the click on 5.0 itself.
    assert_eq!(clicks.len(), 6);
    assert_abs_diff_eq!(clicks[5].target_time, 5.0, epsilon = 1e-12);
    for (k, click) in clicks.iter().enumerate() {
        assert_eq!(click.payload.beat, k as u64);
    }
}

#[test]
fn session_metronome_clicks_once_per_second() {
    // Half a second of lead gives the worker time to see the clock before
    // the first click is due.
    let config = SessionConfig::default()
        .with_metronome(MetronomeConfig::default().with_start_delay(0.5));
    let (backend, device) = SimBackend::new(SAMPLE_RATE);
    let mut session = Session::new(backend, config);
    assert_eq!(session.set_metronome_rate(60), 60);
    session.start_metronome().unwrap();

    // Advance the device 10 ms at a time, no faster than real time, so the
    // worker's 25 ms wake-ups keep pace. Record every click that reaches
    // the mixer queue.
    let step = SAMPLE_RATE as usize / 100;
    let mut targets: Vec<f64> = Vec::new();
    for _ in 0..500 {
        device.render(step, 1).unwrap();
        let pending = device
            .with_mixer(|m| m.pending().map(|e| e.target_time).collect::<Vec<_>>())
            .unwrap();
        for t in pending {
            if !targets.contains(&t) {
                targets.push(t);
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(session.output_time(), Some(5.0));
    session.stop_metronome();

    // Clicks on 0.5, 1.5 .. 4.5; the one on 5.5 is past the window.
    assert_eq!(targets.len(), 5);
    for (k, t) in targets.iter().enumerate() {
        assert_abs_diff_eq!(*t, 0.5 + k as f64, epsilon = 1e-9);
    }
}

#[test]
fn no_drift_over_a_long_run() {
    let clock = SimClock::at(0.0);
    let mut m = metronome(120);
    m.start(&clock);

    // Ten minutes with wake-ups arriving up to 20 ms late.
    let mut rng = SmallRng::seed_from_u64(42);
    let mut clicks = Vec::new();
    let mut k = 0u64;
    while k as f64 * TICK < 600.0 {
        let jitter = if k == 0 { 0.0 } else { rng.gen_range(0.0..0.02) };
        clock.0.set(Some(k as f64 * TICK + jitter));
        m.on_wake(&clock, |event| clicks.push(event));
        k += 1;
    }

    assert!(clicks.len() >= 1200);
    for (n, click) in clicks.iter().enumerate() {
        assert_eq!(click.payload.beat, n as u64);
        assert_abs_diff_eq!(click.target_time, n as f64 * 0.5, epsilon = 1e-9);
    }
}

#[test]
fn tempo_change_keeps_the_pending_click() {
    let clock = SimClock::at(0.0);
    let mut m = metronome(60);
    m.start(&clock);

    let early = run(&mut m, &clock, 0.0, 1.5);
    assert_eq!(early.len(), 2);
    let pending = m.state().next_event_time;
    assert_abs_diff_eq!(pending, 2.0, epsilon = 1e-12);

    assert_eq!(m.set_rate(120), 120);
    let late = run(&mut m, &clock, 1.525, 4.0);

    let times: Vec<f64> = late.iter().map(|c| c.target_time).collect();
    let expected = [2.0, 2.5, 3.0, 3.5, 4.0];
    assert_eq!(times.len(), expected.len());
    for (t, e) in times.iter().zip(expected) {
        assert_abs_diff_eq!(*t, e, epsilon = 1e-12);
    }
}

#[test]
fn stalled_wakeups_skip_missed_beats() {
    let clock = SimClock::at(0.0);
    let mut m = metronome(60);
    m.start(&clock);
    run(&mut m, &clock, 0.0, 0.5);

    // The wake-up thread stalls for three seconds.
    clock.0.set(Some(3.6));
    let mut clicks = Vec::new();
    let outcome = m.on_wake(&clock, |event| clicks.push(event));

    assert_eq!(outcome.skipped, 3);
    assert!(clicks.is_empty());
    assert_abs_diff_eq!(m.state().next_event_time, 4.0, epsilon = 1e-12);

    let resumed = run(&mut m, &clock, 3.625, 4.0);
    assert_eq!(resumed.len(), 1);
    assert_eq!(resumed[0].payload.beat, 4);
}

#[test]
fn no_clock_no_clicks() {
    let clock = SimClock(Cell::new(None));
    let mut m = metronome(300);
    m.start(&clock);

    for _ in 0..10 {
        let outcome = m.on_wake(&clock, |_| panic!("clicked without a clock"));
        assert_eq!(outcome.emitted, 0);
    }
    assert_eq!(m.state().next_event_time, 0.0);

    m.stop();
    assert!(!m.timer_mut().is_armed());
}
