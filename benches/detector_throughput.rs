//! Benchmark for the segmentation hot path: scoring plus state machine
//! stepping per 32ms frame. The whole per-frame budget is 32ms; these
//! numbers should stay microseconds.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use voxgate::detector::{DetectorConfig, SpeechDetector};
use voxgate::scorer::{EnergyScorer, SpeechScorer, calculate_rms};

const FRAME: usize = 512;

fn sine_frame(amplitude: f32) -> Vec<f32> {
    (0..FRAME)
        .map(|i| amplitude * (i as f32 * 0.1).sin())
        .collect()
}

fn bench_rms(c: &mut Criterion) {
    let frame = sine_frame(0.5);
    c.bench_function("rms_512_samples", |b| {
        b.iter(|| calculate_rms(black_box(&frame)))
    });
}

fn bench_detector_step(c: &mut Criterion) {
    let speech = sine_frame(0.5);
    let silence = vec![0.0f32; FRAME];

    c.bench_function("detector_step_alternating", |b| {
        let mut detector = SpeechDetector::new(DetectorConfig::default());
        let mut i = 0u32;
        b.iter(|| {
            // 20 speech frames, then 20 silent ones, repeating — exercises
            // onset, accumulation, and finalization paths.
            let (frame, probability) = if (i / 20) % 2 == 0 {
                (&speech, 0.9)
            } else {
                (&silence, 0.05)
            };
            i = i.wrapping_add(1);
            black_box(detector.step(black_box(frame), probability, &[]));
        })
    });
}

fn bench_score_and_step(c: &mut Criterion) {
    let scorer = EnergyScorer::default();
    let speech = sine_frame(0.5);

    c.bench_function("score_and_step_per_frame", |b| {
        let mut detector = SpeechDetector::new(DetectorConfig::default());
        b.iter(|| {
            let probability = scorer.score(black_box(&speech)).unwrap_or(0.0);
            black_box(detector.step(&speech, probability, &[]));
        })
    });
}

criterion_group!(benches, bench_rms, bench_detector_step, bench_score_and_step);
criterion_main!(benches);
