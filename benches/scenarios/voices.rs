//! Benchmarks for complete instrument patches.
//!
//! Each patch is a `PolyHandler` with a chord held, so the cost covers the
//! oscillators, LFOs, both filters and all envelopes of every sounding voice.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use songsynth::synth::params::normalized_choice;
use songsynth::synth::SynthParam;
use songsynth::{PolyHandler, SampleBanks};

use crate::BLOCK_SIZES;

fn patch(settings: &[(SynthParam, f32)], notes: &[i32]) -> PolyHandler {
    let mut poly = PolyHandler::new();
    for &(param, value) in settings {
        poly.set_parameter(param.id(), value).unwrap();
    }
    for &note in notes {
        poly.note_on(note, 0.8);
    }
    poly
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let banks = SampleBanks::empty();
    let saw = normalized_choice(1, 12);

    // === SUBTRACTIVE LEAD ===
    // Single note: two detuned saws into a resonant lowpass
    let lead = [
        (SynthParam::Osc1Waveform, saw),
        (SynthParam::Osc2Waveform, saw),
        (SynthParam::Osc2Detune, 0.55),
        (SynthParam::Filter1Mode, normalized_choice(1, 7)),
        (SynthParam::Filter1Cutoff, 0.3),
        (SynthParam::Filter1Resonance, 0.5),
    ];

    // === MODULATED PAD ===
    // Four-note chord with LFO on cutoff and both filters in use
    let pad = [
        (SynthParam::Osc1Waveform, saw),
        (SynthParam::Osc2Waveform, normalized_choice(2, 12)),
        (SynthParam::Filter1Mode, normalized_choice(1, 7)),
        (SynthParam::Filter2Mode, normalized_choice(2, 7)),
        (SynthParam::Lfo1Speed, 0.02),
        (SynthParam::Lfo1ModDest, normalized_choice(9, 12)),
        (SynthParam::Lfo1ModAmount, 0.7),
    ];

    // === FM BELL ===
    // Three-operator stack with feedback on the top operator
    let bell = [
        (SynthParam::SynthType, normalized_choice(2, 7)),
        (SynthParam::Osc1Ratio, 0.05),
        (SynthParam::Osc2Ratio, 0.175),
        (SynthParam::Osc3Ratio, 0.1),
        (SynthParam::Osc3Feedback, 0.3),
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; 2 * size];

        for (name, settings, notes) in [
            ("lead", &lead[..], &[60][..]),
            ("pad", &pad[..], &[48, 55, 60, 63][..]),
            ("fm_bell", &bell[..], &[72, 79][..]),
        ] {
            let mut poly = patch(settings, notes);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    poly.render_block(black_box(&mut buffer), black_box(&banks));
                })
            });
        }

        // Full pool: eight voices of the pad
        let mut poly = patch(&pad, &[36, 43, 48, 55, 60, 63, 67, 72]);
        group.bench_with_input(BenchmarkId::new("pad_8_voices", size), &size, |b, _| {
            b.iter(|| {
                poly.render_block(black_box(&mut buffer), black_box(&banks));
            })
        });
    }

    group.finish();
}
