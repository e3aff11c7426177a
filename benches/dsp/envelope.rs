//! Benchmarks for the ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use songsynth::dsp::{EnvMode, EnvelopeGenerator};

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, mode) in [
            ("linear", EnvMode::Linear),
            ("digital", EnvMode::Digital),
            ("analog", EnvMode::Analog),
        ] {
            let mut env = EnvelopeGenerator::new();
            env.set_mode(mode);
            env.set_attack(0.05);
            env.set_decay(0.2);
            env.set_sustain(0.6);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    // Retrigger so every iteration walks attack and decay
                    env.trigger();
                    env.render(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
