//! Benchmarks for full song rendering through the sequencer.
//!
//! These include event dispatch, automation, routing and the effect tracks,
//! like a real arrangement with a lead, a bass and shared effects.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use songsynth::effects::ReverbParam;
use songsynth::sequencing::{AutomationEnvelope, RoutingEdge, VOLUME_PARAM_ID};
use songsynth::synth::SynthParam;
use songsynth::{EngineConfig, SampleBanks, Sequencer, Song, SongEvent, TrackKind, TrackSpec};

use crate::BLOCK_SIZES;

/// Lead and bass into a chorus and a reverb, with a looping note pattern.
fn arrangement() -> Song {
    let mut reverb = vec![0u16; 6];
    reverb[ReverbParam::Mix as usize] = 20_000;
    reverb[ReverbParam::Bandwidth as usize] = 60_000;
    reverb[ReverbParam::Decay as usize] = 45_000;
    reverb[ReverbParam::RoomSize as usize] = 32_768;

    let mut song = Song::new(
        vec![
            TrackSpec::new(TrackKind::Instrument, vec![]),
            TrackSpec::new(TrackKind::Instrument, vec![]),
            TrackSpec::new(TrackKind::Chorus, vec![]),
            TrackSpec::new(TrackKind::Reverb, reverb),
        ],
        3,
    );
    song.routing = vec![
        RoutingEdge::unity(2, 0),
        RoutingEdge::unity(3, 1),
        RoutingEdge::unity(3, 2),
    ];
    song.automation = vec![AutomationEnvelope::new(0, SynthParam::Filter1Cutoff.id(), 0.5)];

    let mut events = vec![
        SongEvent::start_envelope(0, 0, SynthParam::Filter1Cutoff.id() as u8, 96 * 64, 60_000),
        SongEvent::parameter(0, 1, VOLUME_PARAM_ID, 50_000),
    ];
    for bar in 0..64 {
        events.push(SongEvent::note_on(if bar == 0 { 0 } else { 24 }, 1, 36, 110));
        for step in 0..4 {
            events.push(SongEvent::note_on(0, 0, 60 + step * 3, 90));
            events.push(SongEvent::note_off(24, 0, 60 + step * 3));
        }
        events.push(SongEvent::note_off(0, 1, 36));
    }
    song.events = events;
    song
}

pub fn bench_song(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/song");
    let banks = SampleBanks::empty();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; 2 * size];
        let mut progress = 0.0f32;

        let mut seq = Sequencer::new(arrangement(), EngineConfig::default()).unwrap();
        group.bench_with_input(BenchmarkId::new("arrangement", size), &size, |b, _| {
            b.iter(|| {
                seq.render(black_box(&mut buffer), black_box(&banks), &mut progress)
                    .unwrap();
            })
        });

        // Same song with the master bus level and soft clip
        let config = EngineConfig::default()
            .with_output_bus_level(0.8)
            .with_clamp_output(true);
        let mut seq = Sequencer::new(arrangement(), config).unwrap();
        group.bench_with_input(BenchmarkId::new("arrangement_clamped", size), &size, |b, _| {
            b.iter(|| {
                seq.render(black_box(&mut buffer), black_box(&banks), &mut progress)
                    .unwrap();
            })
        });
    }

    group.finish();
}
