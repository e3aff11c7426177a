//! Benchmarks for the state variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use songsynth::dsp::{FilterMode, SVFilter};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    let modes = [
        ("lowpass", FilterMode::LowPass),
        ("highpass", FilterMode::HighPass),
        ("bandpass", FilterMode::BandPassPeak),
        ("bandstop", FilterMode::BandStop),
    ];

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        for (name, mode) in modes {
            let mut filter = SVFilter::new(mode);
            filter.set_cutoff(0.3);
            filter.set_resonance(0.5);
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer));
                })
            });
        }

        // Envelope-modulated lowpass: coefficients recomputed every sample
        let mut filter = SVFilter::lowpass(0.2);
        filter.set_resonance(0.7);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass_modulated", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for (i, sample) in buffer.iter_mut().enumerate() {
                    filter.set_mod(0.5, i as f32 / size as f32);
                    *sample = filter.process(black_box(*sample));
                }
            })
        });
    }

    group.finish();
}
