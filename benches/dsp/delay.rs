//! Benchmarks for delay lines and allpasses.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use songsynth::dsp::{AllPass, DelayLine};

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut buffer = input.clone();

        // Feedback delay, 250ms
        let mut line = DelayLine::with_length(11_025);
        line.set_feedback(0.5);
        group.bench_with_input(BenchmarkId::new("feedback", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                line.render(black_box(&mut buffer));
            })
        });

        // Fractional read, as the chorus uses it
        let mut line = DelayLine::with_length(4_096);
        group.bench_with_input(BenchmarkId::new("fractional_read", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for (i, &sample) in input.iter().enumerate() {
                    line.write(sample);
                    sum += line.delayed_by_frac(black_box(800.0 + i as f32 * 0.37));
                }
                sum
            })
        });

        let mut apf = AllPass::new();
        apf.set_length(379);
        apf.set_feedback(0.625);
        group.bench_with_input(BenchmarkId::new("allpass", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += apf.process(black_box(sample));
                }
                sum
            })
        });
    }

    group.finish();
}
