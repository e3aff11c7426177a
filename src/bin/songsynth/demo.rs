//! Built-in demo arrangement: a filtered saw arpeggio through an echo into a
//! reverb, with a slow cutoff sweep and a fade at the end.

use songsynth::effects::{EchoMode, EchoParam, ReverbParam};
use songsynth::sequencing::{AutomationEnvelope, RoutingEdge, VOLUME_PARAM_ID};
use songsynth::synth::params::normalized_choice;
use songsynth::synth::SynthParam;
use songsynth::{Song, SongEvent, TrackKind, TrackSpec};

const LEAD: i32 = 0;
const ECHO: usize = 1;
const REVERB: usize = 2;

/// Ticks per quarter note.
const DIVISION: i32 = 96;
const SIXTEENTH: i32 = DIVISION / 4;

/// C minor, Ab major, Eb major, Bb major.
const CHORDS: [[i32; 4]; 4] = [
    [48, 51, 55, 60],
    [44, 48, 51, 56],
    [51, 55, 58, 63],
    [46, 50, 53, 58],
];

fn unit(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * 65_535.0).round() as u16
}

/// Patch tweaks sent at tick 0 on top of the instrument defaults.
fn lead_patch() -> Vec<SongEvent> {
    let saw = normalized_choice(1, 12);
    [
        (SynthParam::Osc1Waveform, saw),
        (SynthParam::Osc2Waveform, saw),
        (SynthParam::Osc2Detune, 0.53),
        (SynthParam::Filter1Cutoff, 0.25),
        (SynthParam::Filter1Resonance, 0.4),
        (SynthParam::AmpAttack, 0.0),
        (SynthParam::AmpDecay, 0.3),
        (SynthParam::AmpSustain, 0.4),
        (SynthParam::AmpRelease, 0.2),
    ]
    .into_iter()
    .map(|(param, value)| SongEvent::parameter(0, LEAD, param.id(), unit(value)))
    .collect()
}

fn arpeggio() -> Vec<SongEvent> {
    let mut events = Vec::new();
    let mut pending = 0;
    for _ in 0..2 {
        for chord in CHORDS {
            for step in 0..16 {
                let note = chord[step % 4] + if step >= 8 { 12 } else { 0 };
                events.push(SongEvent::note_on(pending, LEAD, note, 90 + (step as i32 % 4) * 8));
                events.push(SongEvent::note_off(SIXTEENTH / 2, LEAD, note));
                pending = SIXTEENTH - SIXTEENTH / 2;
            }
        }
    }
    events
}

pub fn song() -> Song {
    let echo = {
        let mut params = vec![0; 6];
        params[EchoParam::Mode as usize] = unit(normalized_choice(3, EchoMode::ALL.len()));
        params[EchoParam::Mix as usize] = unit(1.0);
        // Dotted eighth at 120 BPM.
        params[EchoParam::Time as usize] = unit(0.375 / 2.0);
        params[EchoParam::Feedback as usize] = unit(0.45);
        params[EchoParam::LowPass as usize] = unit(0.6);
        params[EchoParam::HighPass as usize] = unit(0.1);
        params
    };
    let reverb = {
        let mut params = vec![0; 6];
        params[ReverbParam::Mix as usize] = unit(0.3);
        params[ReverbParam::PreDelay as usize] = unit(0.01);
        params[ReverbParam::Bandwidth as usize] = unit(0.7);
        params[ReverbParam::Damping as usize] = unit(0.2);
        params[ReverbParam::Decay as usize] = unit(0.75);
        params[ReverbParam::RoomSize as usize] = unit(0.6);
        params
    };

    let mut song = Song::new(
        vec![
            TrackSpec::new(TrackKind::Instrument, vec![]),
            TrackSpec::new(TrackKind::Echo, echo),
            TrackSpec::new(TrackKind::Reverb, reverb),
        ],
        REVERB,
    );
    song.division = DIVISION as f32;
    song.routing = vec![
        RoutingEdge::unity(REVERB, LEAD as usize),
        RoutingEdge::new(ECHO, LEAD as usize, 6_000),
        RoutingEdge::unity(REVERB, ECHO),
    ];
    let cutoff = SynthParam::Filter1Cutoff.id();
    song.automation = vec![
        AutomationEnvelope::new(LEAD as usize, cutoff, 0.25),
        AutomationEnvelope::new(LEAD as usize, VOLUME_PARAM_ID, 0.8),
    ];

    let bar = 4 * DIVISION;
    let mut events = lead_patch();
    events.push(SongEvent::start_envelope(0, LEAD, cutoff as u8, 4 * bar, unit(0.7)));
    let arp = arpeggio();
    let fade_at = arp.len() - 32;
    for (i, event) in arp.into_iter().enumerate() {
        events.push(event);
        if i == fade_at {
            events.push(SongEvent::start_envelope(0, LEAD, VOLUME_PARAM_ID as u8, bar, 0));
        }
    }
    song.events = events;
    song
}
