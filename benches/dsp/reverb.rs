//! Benchmarks for the plate reverb.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use songsynth::effects::Reverb;
use songsynth::StereoEffect;

use crate::{stereo_input, BLOCK_SIZES};

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        let input = stereo_input(size);
        let mut buffer = input.clone();

        // Small room (short tail)
        let mut reverb = Reverb::new();
        reverb.set_room_size(0.3);
        reverb.set_decay(0.3);
        reverb.set_damping(0.5);
        group.bench_with_input(BenchmarkId::new("small_room", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                reverb.render(black_box(&mut buffer));
            })
        });

        // Large hall with predelay
        let mut reverb = Reverb::new();
        reverb.set_room_size(1.0);
        reverb.set_decay(0.85);
        reverb.set_predelay(0.02);
        group.bench_with_input(BenchmarkId::new("large_hall", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                reverb.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
