//! Chord preview end to end: strum planning, the session and the output
//! callback, with a simulated device standing in for the sound card.

use approx::assert_abs_diff_eq;
use fw_audio::SimBackend;
use fw_core::{find_chord, CHORD_LIBRARY};
use fw_engine::{plan_strum, PluckConfig};
use fw_session::{Session, SessionConfig};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const SAMPLE_RATE: u32 = 8000;

#[test]
fn every_library_chord_strums_its_sounding_strings() {
    let mut rng = SmallRng::seed_from_u64(3);
    let pluck = PluckConfig::default().with_duration(0.25);

    for shape in CHORD_LIBRARY.iter() {
        let events = plan_strum(&shape.voices(), 0.5, 0.03, &pluck, SAMPLE_RATE, &mut rng);
        assert_eq!(events.len(), shape.sounding_strings(), "{}", shape.name);
        for (k, event) in events.iter().enumerate() {
            assert_abs_diff_eq!(event.target_time, 0.5 + k as f64 * 0.03, epsilon = 1e-12);
            assert_eq!(event.payload.len(), 2000);
            assert!(event.payload.peak() <= 1.0);
        }
    }
}

#[test]
fn strum_with_zero_delay_strikes_together() {
    let voices = find_chord("em").unwrap().voices();
    let mut rng = SmallRng::seed_from_u64(5);
    let events = plan_strum(&voices, 1.0, 0.0, &PluckConfig::default(), SAMPLE_RATE, &mut rng);
    assert_eq!(events.len(), 6);
    assert!(events.iter().all(|e| e.target_time == 1.0));
}

#[test]
fn e_major_sounds_through_the_output() {
    let (backend, device) = SimBackend::new(SAMPLE_RATE);
    let mut session = Session::new(backend, SessionConfig::default());

    let strings = session.play_shape(find_chord("e").unwrap()).unwrap();
    assert_eq!(strings, 6);

    // First 20 ms: nothing has started yet.
    let lead = device.render(160, 1).unwrap();
    assert!(lead.iter().all(|s| *s == 0.0));
    assert_eq!(device.with_mixer(|m| m.pending_voices()), Some(6));

    // Half a second later every string is sounding.
    let body = device.render(4000, 1).unwrap();
    assert!(body.iter().any(|s| *s != 0.0));
    assert!(body.iter().all(|s| (-1.0..=1.0).contains(s)));
    assert_eq!(device.with_mixer(|m| m.active_voices()), Some(6));

    // After the last string ends the mixer is idle and only the highpass
    // tail remains.
    device.render(SAMPLE_RATE as usize * 2, 1).unwrap();
    assert_eq!(device.with_mixer(|m| m.active_voices()), Some(0));
    let tail = device.render(800, 1).unwrap();
    assert!(tail.iter().all(|s| s.abs() < 1e-6));

    // Retired buffers are reclaimed on the next request.
    assert_eq!(session.play_shape(find_chord("c").unwrap()).unwrap(), 5);
    session.dispose();
}
