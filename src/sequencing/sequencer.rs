//! Sample-accurate song playback and mixing.
//!
//! Each output frame the sequencer
//!
//! 1. dispatches every event whose timestamp has been reached,
//! 2. loads the per-track accumulators with last frame's feedback sends,
//! 3. walks the tracks in index order: advances their automation, renders
//!    them, applies their volume and adds their output into every track they
//!    send to,
//! 4. copies the two master accumulators to the output.
//!
//! A send to a later track arrives in the same frame. A send to the same or
//! an earlier track has already missed that track's turn, so it is held
//! back and arrives one frame late, which keeps cyclic routing stable.

use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dsp::math;
use crate::error::{Result, SynthError};
use crate::io::samples::SampleBanks;
use crate::sequencing::automation::AutomationEnvelope;
use crate::sequencing::event::{EventKind, SongEvent};
use crate::sequencing::routing::RoutingEdge;
use crate::sequencing::song::{bpm_to_us_per_quarter, samples_per_tick, Song};
use crate::sequencing::track::Track;
use crate::synth::{PolyHandler, SynthParam};
use crate::SAMPLE_RATE;

/// Output level below which the song counts as silent.
const SILENCE_THRESHOLD: f32 = 0.01;

pub struct Sequencer {
    config: EngineConfig,
    tracks: Vec<Track>,
    routing: Vec<RoutingEdge>,
    automation: Vec<AutomationEnvelope>,
    events: Vec<SongEvent>,
    master: [usize; 2],

    /// Two accumulators per track.
    outs: Vec<f32>,
    /// Sends to already rendered tracks, fed in on the next frame.
    feedback: Vec<f32>,
    volumes: Vec<f32>,

    division: f32,
    us_per_quarter: f32,
    samples_per_tick: f32,

    /// Index of the next event to dispatch.
    event_index: usize,
    /// Absolute sample at which that event fires.
    next_event_at: u64,
    /// Frames rendered since the start of the song.
    position: u64,
    idle_countdown: Option<u32>,
    finished: bool,
}

impl Sequencer {
    pub fn new(song: Song, config: EngineConfig) -> Result<Self> {
        song.validate()?;

        let tracks = song
            .tracks
            .iter()
            .map(|spec| Track::with_params(spec.kind, &spec.params))
            .collect::<Result<Vec<_>>>()?;
        let num_tracks = tracks.len();

        let us_per_quarter = bpm_to_us_per_quarter(song.tempo_bpm);
        let samples_per_tick = samples_per_tick(us_per_quarter, song.division);
        let next_event_at = song
            .events
            .first()
            .map_or(0, |e| ticks_to_samples(e.delta_ticks, samples_per_tick));

        let mut sequencer = Self {
            config,
            tracks,
            routing: song.routing,
            automation: song.automation,
            events: song.events,
            master: song.master,
            outs: vec![0.0; 2 * num_tracks],
            feedback: vec![0.0; 2 * num_tracks],
            volumes: vec![1.0; num_tracks],
            division: song.division,
            us_per_quarter,
            samples_per_tick,
            event_index: 0,
            next_event_at,
            position: 0,
            idle_countdown: None,
            finished: false,
        };
        for track in sequencer.tracks.iter_mut() {
            track.set_tempo(song.tempo_bpm)?;
        }
        // Volume slots start the track at their resting value.
        for env in sequencer.automation.iter().filter(|e| e.is_volume()) {
            sequencer.volumes[env.track] = math::clamp01(env.value);
        }
        Ok(sequencer)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_mut(&mut self, index: usize) -> Result<&mut Track> {
        self.tracks
            .get_mut(index)
            .ok_or(SynthError::UnknownTrack(index))
    }

    /// Volume multiplier of a track, as last set by automation.
    pub fn volume(&self, track: usize) -> Option<f32> {
        self.volumes.get(track).copied()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn tempo_bpm(&self) -> f32 {
        60_000_000.0 / self.us_per_quarter
    }

    pub fn events_exhausted(&self) -> bool {
        self.event_index >= self.events.len()
    }

    /// True once the silence detector has ended the song.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Render into an interleaved stereo buffer.
    ///
    /// State carries over between calls, so a stream can be rendered one
    /// buffer at a time. `progress` is raised in 1 % steps of this buffer and
    /// ends at 1.0, which is also returned.
    pub fn render(&mut self, out: &mut [f32], banks: &SampleBanks, progress: &mut f32) -> Result<f32> {
        let frames = out.len() / 2;
        let progress_step = (frames / 100).max(1);
        *progress = 0.0;

        if self.config.report_progress {
            info!(
                "rendering {} frames from sample {}, {} events left",
                frames,
                self.position,
                self.events.len() - self.event_index
            );
        }

        for (i, frame) in out.chunks_exact_mut(2).enumerate() {
            if self.finished {
                frame.fill(0.0);
                continue;
            }

            self.dispatch_due_events()?;
            let [left, right] = self.next_frame(banks)?;
            frame[0] = left;
            frame[1] = right;

            if i % progress_step == 0 {
                *progress = i as f32 / frames as f32;
                if self.config.report_progress {
                    debug!("sample {} / {} ({:.0}%)", i, frames, *progress * 100.0);
                }
            }

            if self.config.stop_on_silence && self.silence_elapsed(left, right) {
                info!(
                    "idle for {} samples, stopping at sample {}",
                    SAMPLE_RATE as u32, self.position
                );
                self.finished = true;
            }
            self.position += 1;
        }

        if self.config.report_progress {
            info!("render done at sample {}", self.position);
        }
        *progress = 1.0;
        Ok(*progress)
    }

    fn silence_elapsed(&mut self, left: f32, right: f32) -> bool {
        if !self.events_exhausted() {
            return false;
        }
        let full = SAMPLE_RATE as u32;
        let mut countdown = self.idle_countdown.unwrap_or(full);
        if left.abs() > SILENCE_THRESHOLD || right.abs() > SILENCE_THRESHOLD {
            countdown = full;
        }
        countdown = countdown.saturating_sub(1);
        self.idle_countdown = Some(countdown);
        countdown == 0
    }

    fn dispatch_due_events(&mut self) -> Result<()> {
        while let Some(&event) = self.events.get(self.event_index) {
            if self.position < self.next_event_at {
                break;
            }
            self.dispatch(event)?;
            self.event_index += 1;
            if let Some(next) = self.events.get(self.event_index) {
                self.next_event_at += ticks_to_samples(next.delta_ticks, self.samples_per_tick);
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, event: SongEvent) -> Result<()> {
        let Some(kind) = event.kind() else {
            warn!(
                "ignoring unknown event {} on track {} ({}, {})",
                event.kind, event.channel, event.param1, event.param2
            );
            return Ok(());
        };
        let channel = usize::try_from(event.channel).unwrap_or(usize::MAX);

        match kind {
            EventKind::NoteOn => {
                if let Some(poly) = self.instrument(channel, kind)? {
                    if event.param2 > 0 {
                        poly.note_on(event.param1, event.param2 as f32 / 127.0);
                    } else {
                        poly.note_off(event.param1);
                    }
                }
            }
            EventKind::NoteOff => {
                if let Some(poly) = self.instrument(channel, kind)? {
                    poly.note_off(event.param1);
                }
            }
            EventKind::PitchBend => {
                if let Some(poly) = self.instrument(channel, kind)? {
                    let wheel = event.param2.clamp(0, 16_383) as f32 / 16_383.0;
                    poly.set_parameter(SynthParam::PitchBend.id(), wheel)?;
                }
            }
            EventKind::ControlCode => {}
            EventKind::ParameterChange => {
                let Ok(id) = u16::try_from(event.param1) else {
                    warn!(
                        "ignoring parameter id {} on track {}",
                        event.param1, event.channel
                    );
                    return Ok(());
                };
                let value = event.param2 as f32 / 65_535.0;
                for env in self.automation.iter_mut().filter(|e| e.matches(channel, id)) {
                    env.set_value(value);
                    if env.is_volume() {
                        self.volumes[channel] = value;
                    }
                }
                self.track_mut(channel)?.set_parameter(id, value)?;
            }
            EventKind::Division => {
                if event.param2 > 0 {
                    self.division = event.param2 as f32;
                    self.update_tick_length();
                } else {
                    warn!("ignoring division {}", event.param2);
                }
            }
            EventKind::Tempo => {
                if event.param2 > 0 {
                    let bpm = event.param2 as f32 / 100.0;
                    self.us_per_quarter = bpm_to_us_per_quarter(bpm);
                    self.update_tick_length();
                    for track in self.tracks.iter_mut() {
                        track.set_tempo(bpm)?;
                    }
                } else {
                    warn!("ignoring tempo {}", event.param2);
                }
            }
            EventKind::AllNotesOff => {
                if let Some(poly) = self.instrument(channel, kind)? {
                    poly.all_notes_off();
                }
            }
            EventKind::StartEnvelope => {
                let id = (event.param1 % 256) as u16;
                let ticks = (event.param1 / 256) as f32;
                let target = event.param2 as f32 / 65_535.0;
                let samples = (ticks * self.samples_per_tick).round().max(0.0) as u32;
                let interval = self.config.automation_interval;
                let mut started = false;
                for env in self.automation.iter_mut().filter(|e| e.matches(channel, id)) {
                    env.start(target, samples, interval);
                    started = true;
                }
                if !started {
                    debug!("no automation slot for parameter {} on track {}", id, channel);
                }
            }
        }
        Ok(())
    }

    /// The addressed instrument, or `None` (with a warning) for effect tracks.
    fn instrument(
        &mut self,
        channel: usize,
        kind: EventKind,
    ) -> Result<Option<&mut PolyHandler>> {
        let track = self.track_mut(channel)?;
        let poly = track.instrument_mut();
        if poly.is_none() {
            warn!("{:?} sent to effect track {}", kind, channel);
        }
        Ok(poly)
    }

    fn update_tick_length(&mut self) {
        self.samples_per_tick = samples_per_tick(self.us_per_quarter, self.division);
    }

    /// Render every track once and return the master pair.
    fn next_frame(&mut self, banks: &SampleBanks) -> Result<[f32; 2]> {
        self.outs.copy_from_slice(&self.feedback);
        self.feedback.fill(0.0);
        let interval = self.config.automation_interval;

        for k in 0..self.tracks.len() {
            for env in self.automation.iter_mut().filter(|e| e.track == k) {
                let Some(value) = env.tick(interval) else {
                    continue;
                };
                if env.is_volume() {
                    self.volumes[k] = value;
                } else {
                    self.tracks[k].set_parameter(env.param_id, value)?;
                }
            }

            let mut frame = [self.outs[2 * k], self.outs[2 * k + 1]];
            self.tracks[k].render(&mut frame, banks);
            let volume = self.volumes[k];
            self.outs[2 * k] = frame[0] * volume;
            self.outs[2 * k + 1] = frame[1] * volume;

            for edge in self.routing.iter().filter(|e| e.source == k) {
                let level = edge.level();
                let dst = edge.destination;
                let sent = [self.outs[2 * k] * level, self.outs[2 * k + 1] * level];
                let target = if dst > k {
                    &mut self.outs
                } else {
                    &mut self.feedback
                };
                target[2 * dst] += sent[0];
                target[2 * dst + 1] += sent[1];
            }
        }

        let mut left = self.outs[self.master[0]];
        let mut right = self.outs[self.master[1]];
        if let Some(level) = self.config.output_bus_level {
            left *= level;
            right *= level;
        }
        if self.config.clamp_output {
            left = math::rational_tanh(left);
            right = math::rational_tanh(right);
        }
        Ok([left, right])
    }
}

#[inline]
fn ticks_to_samples(ticks: i32, samples_per_tick: f32) -> u64 {
    (ticks.max(0) as f32 * samples_per_tick).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EchoMode, EchoParam};
    use crate::io::samples::NO_SAMPLES;
    use crate::sequencing::automation::VOLUME_PARAM_ID;
    use crate::sequencing::song::TrackSpec;
    use crate::sequencing::track::TrackKind;
    use crate::synth::params::normalized_choice;

    /// 120 BPM at 441 ticks per quarter: exactly 50 samples per tick.
    fn song(tracks: Vec<TrackSpec>, master: usize) -> Song {
        let mut song = Song::new(tracks, master);
        song.division = 441.0;
        song
    }

    fn instrument() -> TrackSpec {
        TrackSpec::new(TrackKind::Instrument, vec![])
    }

    fn render(seq: &mut Sequencer, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * 2];
        let mut progress = 0.0;
        seq.render(&mut out, &NO_SAMPLES, &mut progress).unwrap();
        assert_eq!(progress, 1.0);
        out
    }

    fn first_sound(out: &[f32]) -> Option<usize> {
        out.chunks_exact(2)
            .position(|f| f[0].abs() > 1e-4 || f[1].abs() > 1e-4)
    }

    /// Sine oscillators start at phase zero, so the first non-zero frame
    /// trails the note-on by a sample or two.
    fn assert_onset(out: &[f32], at: usize) {
        let onset = first_sound(out).expect("no sound");
        assert!((at..=at + 4).contains(&onset), "onset {} expected {}", onset, at);
    }

    #[test]
    fn note_starts_on_its_sample() {
        let mut s = song(vec![instrument()], 0);
        s.events = vec![SongEvent::note_on(10, 0, 60, 100)];
        let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();
        let out = render(&mut seq, 2_000);
        assert_onset(&out, 500);
    }

    #[test]
    fn zero_delta_events_share_a_sample() {
        let mut s = song(vec![instrument()], 0);
        s.events = vec![
            SongEvent::note_on(4, 0, 60, 100),
            SongEvent::note_on(0, 0, 64, 100),
            SongEvent::note_on(0, 0, 67, 100),
        ];
        let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();
        render(&mut seq, 201);
        let Track::Instrument(poly) = &seq.tracks()[0] else {
            panic!("not an instrument");
        };
        let held = poly.voices().iter().filter(|v| v.is_note_on()).count();
        assert_eq!(held, 3);
        assert!(seq.events_exhausted());
    }

    #[test]
    fn velocity_zero_releases() {
        let mut s = song(vec![instrument()], 0);
        s.events = vec![SongEvent::note_on(0, 0, 60, 100), SongEvent::note_on(1, 0, 60, 0)];
        let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();
        render(&mut seq, 100);
        let Track::Instrument(poly) = &seq.tracks()[0] else {
            panic!("not an instrument");
        };
        assert!(!poly.is_active());
    }

    #[test]
    fn routing_feeds_effect_and_master() {
        // Instrument 0 -> echo 1 (master). Echo starts fully wet but off,
        // so nothing reaches the master until it is switched to stereo.
        let echo_params = vec![0, 65_535, 655];
        let mut s = song(
            vec![instrument(), TrackSpec::new(TrackKind::Echo, echo_params)],
            1,
        );
        s.routing.push(RoutingEdge::unity(1, 0));
        s.events = vec![SongEvent::note_on(0, 0, 60, 100)];
        let mut seq = Sequencer::new(s.clone(), EngineConfig::default()).unwrap();
        let out = render(&mut seq, 2_000);
        assert_eq!(first_sound(&out), None);

        let stereo = (normalized_choice(2, EchoMode::ALL.len()) * 65_535.0).round() as u16;
        s.events.insert(0, SongEvent::parameter(0, 1, EchoParam::Mode as u16, stereo));
        let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();
        let out = render(&mut seq, 2_000);
        // 655 / 65535 of the two second buffer is 881 samples.
        let onset = first_sound(&out).expect("echo never sounded");
        assert!((870..=890).contains(&onset), "onset {}", onset);
    }

    #[test]
    fn automation_ramps_volume() {
        let mut s = song(vec![instrument()], 0);
        s.automation
            .push(AutomationEnvelope::new(0, VOLUME_PARAM_ID, 1.0));
        // 20 ticks = 1000 samples down to silence.
        s.events = vec![SongEvent::start_envelope(0, 0, VOLUME_PARAM_ID as u8, 20, 0)];
        let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();

        render(&mut seq, 500);
        let mid = seq.volume(0).unwrap();
        assert!(mid > 0.3 && mid < 0.7, "halfway volume {}", mid);
        render(&mut seq, 600);
        assert_eq!(seq.volume(0), Some(0.0));
    }

    #[test]
    fn volume_slot_sets_starting_level() {
        let mut s = song(vec![instrument()], 0);
        s.automation
            .push(AutomationEnvelope::new(0, VOLUME_PARAM_ID, 0.5));
        let seq = Sequencer::new(s, EngineConfig::default()).unwrap();
        assert_eq!(seq.volume(0), Some(0.5));
    }

    #[test]
    fn parameter_change_snaps_automation() {
        let mut s = song(vec![instrument()], 0);
        s.automation
            .push(AutomationEnvelope::new(0, VOLUME_PARAM_ID, 1.0));
        s.events = vec![SongEvent::parameter(3, 0, VOLUME_PARAM_ID, 16_384)];
        let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();
        render(&mut seq, 200);
        let volume = seq.volume(0).unwrap();
        assert!((volume - 0.25).abs() < 1e-3, "{}", volume);
    }

    #[test]
    fn volume_change_without_slot_keeps_level() {
        let mut s = song(vec![instrument()], 0);
        s.events = vec![SongEvent::parameter(0, 0, VOLUME_PARAM_ID, 0)];
        let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();
        render(&mut seq, 10);
        assert_eq!(seq.volume(0), Some(1.0));
    }

    #[test]
    fn out_of_range_parameter_id_is_ignored() {
        let held = |extra: Option<SongEvent>| {
            let mut s = song(vec![instrument()], 0);
            s.events.extend(extra);
            s.events.push(SongEvent::note_on(0, 0, 60, 100));
            let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();
            let out = render(&mut seq, 22_050);
            out[2 * 11_025..].iter().fold(0.0f32, |acc, x| acc.max(x.abs()))
        };
        // Would land on AmpSustain if the id were truncated to 16 bits.
        let wrapped = SongEvent::new(
            0,
            EventKind::ParameterChange,
            0,
            65_536 + SynthParam::AmpSustain.id() as i32,
            0,
        );
        let plain = held(None);
        assert!(plain > 0.05, "held peak {}", plain);
        assert_eq!(held(Some(wrapped)), plain);
    }

    #[test]
    fn tempo_event_rescales_following_deltas() {
        let mut s = song(vec![instrument()], 0);
        s.events = vec![
            SongEvent::tempo(0, 60.0),
            // Now 100 samples per tick.
            SongEvent::note_on(5, 0, 60, 100),
        ];
        let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();
        let out = render(&mut seq, 1_000);
        assert_onset(&out, 500);
        assert!((seq.tempo_bpm() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn unknown_events_are_skipped() {
        let mut s = song(vec![instrument()], 0);
        s.events = vec![
            SongEvent { delta_ticks: 0, kind: 99, channel: 0, param1: 1, param2: 2 },
            SongEvent::note_on(0, 0, 60, 100),
        ];
        let mut seq = Sequencer::new(s, EngineConfig::default()).unwrap();
        let out = render(&mut seq, 100);
        assert_onset(&out, 0);
    }

    #[test]
    fn streaming_matches_single_render() {
        let mut s = song(vec![instrument()], 0);
        s.events = vec![
            SongEvent::note_on(3, 0, 60, 100),
            SongEvent::note_on(7, 0, 67, 90),
            SongEvent::note_off(20, 0, 60),
        ];

        let mut whole = Sequencer::new(s.clone(), EngineConfig::default()).unwrap();
        let expected = render(&mut whole, 3_000);

        let mut streamed = Sequencer::new(s, EngineConfig::default()).unwrap();
        let mut actual = Vec::new();
        for _ in 0..6 {
            actual.extend(render(&mut streamed, 500));
        }
        assert_eq!(expected, actual);
    }

    #[test]
    fn silence_stops_render_after_a_second() {
        let mut s = song(vec![instrument()], 0);
        s.events = vec![SongEvent::note_on(0, 0, 60, 0)];
        let config = EngineConfig::default().with_stop_on_silence(true);
        let mut seq = Sequencer::new(s, config).unwrap();
        render(&mut seq, 50_000);
        assert!(seq.is_finished());
        assert_eq!(seq.position(), SAMPLE_RATE as u64);
    }

    #[test]
    fn send_to_earlier_track_arrives_one_frame_late() {
        // Track 0 is a bypassed filter fed by the instrument on track 1.
        let tracks = || {
            vec![
                TrackSpec::new(TrackKind::StereoFilter, vec![]),
                instrument(),
            ]
        };
        let events = vec![SongEvent::note_on(0, 1, 69, 127)];

        let mut direct = song(tracks(), 1);
        direct.events = events.clone();
        let mut looped = song(tracks(), 0);
        looped.routing.push(RoutingEdge::unity(0, 1));
        looped.events = events;

        let direct = render(&mut Sequencer::new(direct, EngineConfig::default()).unwrap(), 400);
        let looped = render(&mut Sequencer::new(looped, EngineConfig::default()).unwrap(), 400);

        assert!(looped[0].abs() < 1e-9 && looped[1].abs() < 1e-9);
        for i in 1..400 {
            let diff = (looped[2 * i] - direct[2 * (i - 1)]).abs();
            assert!(diff < 1e-5, "frame {}: {}", i, diff);
        }
    }

    #[test]
    fn bus_level_and_clamp_shape_master() {
        let mut s = song(vec![instrument()], 0);
        s.events = vec![SongEvent::note_on(0, 0, 60, 127)];
        let plain = render(&mut Sequencer::new(s.clone(), EngineConfig::default()).unwrap(), 4_000);
        let config = EngineConfig::default().with_output_bus_level(0.5);
        let halved = render(&mut Sequencer::new(s.clone(), config).unwrap(), 4_000);
        for (a, b) in plain.iter().zip(&halved) {
            assert!((a * 0.5 - b).abs() < 1e-6);
        }

        let config = EngineConfig::default().with_output_bus_level(50.0).with_clamp_output(true);
        let clamped = render(&mut Sequencer::new(s, config).unwrap(), 4_000);
        assert!(clamped.iter().all(|s| s.abs() <= 1.0));
    }
}
