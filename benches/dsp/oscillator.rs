//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use songsynth::dsp::{Oscillator, OscillatorWaveform};
use songsynth::SampleBanks;

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let banks = SampleBanks::empty();

    let waveforms = [
        // Uses the parabolic sine approximation
        ("sine", OscillatorWaveform::Sine),
        // Ramp plus two PolyBLEP corrections
        ("blep_saw", OscillatorWaveform::BlepSaw),
        ("blep_square", OscillatorWaveform::BlepSquare),
        ("raw_saw", OscillatorWaveform::RawSaw),
        ("raw_triangle", OscillatorWaveform::RawTriangle),
        // XOR-feedback generator
        ("noise", OscillatorWaveform::Noise),
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, waveform) in waveforms {
            let mut osc = Oscillator::audio();
            osc.set_waveform_kind(waveform);
            osc.trigger_at(440.0);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = osc.next_sample(black_box(&banks));
                    }
                    black_box(&buffer);
                })
            });
        }
    }

    group.finish();
}
