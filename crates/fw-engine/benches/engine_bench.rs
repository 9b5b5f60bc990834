use std::f32::consts::TAU;
use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use fw_core::{find_chord, SampleBlock, ScheduledEvent, StringVoice};
use fw_engine::{estimate_samples, pluck_into, Mixer, MixerConfig};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn sine_block(frequency: f32, sample_rate: u32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (TAU * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn bench_estimate(c: &mut Criterion) {
    let low_e = sine_block(82.41, 44100, 2048);
    let a4 = sine_block(440.0, 44100, 2048);

    c.bench_function("estimate_low_e_2048", |b| {
        b.iter(|| estimate_samples(black_box(&low_e), 44100))
    });
    c.bench_function("estimate_a4_2048", |b| {
        b.iter(|| estimate_samples(black_box(&a4), 44100))
    });
}

fn bench_pluck(c: &mut Criterion) {
    let voice = StringVoice::new(110.0, 0, 0.995);
    let mut out = vec![0.0f32; 66150];
    let mut rng = SmallRng::seed_from_u64(0);

    c.bench_function("pluck_1_5s", |b| {
        b.iter(|| pluck_into(black_box(&voice), &mut out, 44100, &mut rng))
    });
}

fn bench_mixer(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(1);
    let blocks: Vec<Arc<SampleBlock>> = find_chord("e")
        .map(|chord| chord.voices())
        .unwrap_or([StringVoice::muted(82.41, 0.996); 6])
        .iter()
        .map(|voice| {
            Arc::new(fw_engine::pluck_with_rng(voice, 1.5, 44100, &mut rng))
        })
        .collect();
    let mut out = vec![0.0f32; 512 * 2];

    c.bench_function("mixer_six_voices_512", |b| {
        b.iter(|| {
            let mut mixer = Mixer::new(MixerConfig::default(), 44100);
            for block in &blocks {
                let _ = mixer.schedule(ScheduledEvent::new(0.0, block.clone()));
            }
            mixer.render(&mut out, 2, drop);
        })
    });
}

criterion_group!(benches, bench_estimate, bench_pluck, bench_mixer);
criterion_main!(benches);
