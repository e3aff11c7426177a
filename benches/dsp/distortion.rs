//! Benchmarks for the distortion effect, with and without oversampling.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use songsynth::effects::{Distortion, DistortionMode, DistortionParam, OversamplingMode};
use songsynth::synth::params::normalized_choice;
use songsynth::StereoEffect;

use crate::{stereo_input, BLOCK_SIZES};

fn choice<T: PartialEq>(all: &[T], wanted: T) -> f32 {
    let index = all.iter().position(|m| *m == wanted).unwrap_or(0);
    normalized_choice(index, all.len())
}

fn distortion(mode: DistortionMode, oversampling: OversamplingMode) -> Distortion {
    let mut fx = Distortion::new();
    fx.set_parameter(DistortionParam::Mode as u16, choice(&DistortionMode::ALL, mode))
        .unwrap();
    fx.set_parameter(
        DistortionParam::Oversampling as u16,
        choice(&OversamplingMode::ALL, oversampling),
    )
    .unwrap();
    fx.set_parameter(DistortionParam::Mix as u16, 1.0).unwrap();
    fx.set_parameter(DistortionParam::Drive as u16, 0.5).unwrap();
    fx
}

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    let cases = [
        ("tanh", DistortionMode::Tanh, OversamplingMode::Off),
        ("clip", DistortionMode::Clip, OversamplingMode::Off),
        ("foldback", DistortionMode::Foldback, OversamplingMode::Off),
        ("bit_depth", DistortionMode::BitDepth, OversamplingMode::Off),
        // Each ×2 stage runs the shaper twice and adds two half-band filters
        ("tanh_x2", DistortionMode::Tanh, OversamplingMode::X2),
        ("tanh_x4", DistortionMode::Tanh, OversamplingMode::X4),
        ("tanh_x8", DistortionMode::Tanh, OversamplingMode::X8),
    ];

    for &size in BLOCK_SIZES {
        let input = stereo_input(size);
        let mut buffer = input.clone();

        for (name, mode, oversampling) in cases {
            let mut fx = distortion(mode, oversampling);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    fx.render(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
