//! Benchmarks for the delay-based stereo effects and the stereo filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use songsynth::dsp::FilterMode;
use songsynth::effects::{Chorus, Echo, EchoMode, StereoFilter};
use songsynth::StereoEffect;

use crate::{stereo_input, BLOCK_SIZES};

pub fn bench_modulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/modulation");

    for &size in BLOCK_SIZES {
        let input = stereo_input(size);
        let mut buffer = input.clone();

        // LFO-swept fractional delay per side
        let mut chorus = Chorus::new();
        chorus.set_rate(0.2);
        chorus.set_depth(0.8);
        chorus.set_feedback(0.3);
        group.bench_with_input(BenchmarkId::new("chorus", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                chorus.render(black_box(&mut buffer));
            })
        });

        for (name, mode) in [("echo_stereo", EchoMode::Stereo), ("echo_cross", EchoMode::Cross)] {
            let mut echo = Echo::new();
            echo.set_mode(mode);
            echo.set_time(0.2);
            echo.set_feedback(0.5);
            echo.set_lowpass(0.6);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    echo.render(black_box(&mut buffer));
                })
            });
        }

        let mut filter = StereoFilter::new();
        filter.set_mode(FilterMode::LowPass);
        filter.set_cutoff(0.4);
        filter.set_resonance(0.6);
        group.bench_with_input(BenchmarkId::new("stereo_filter", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
