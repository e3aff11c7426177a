use crate::error::{Result, SynthError};
use crate::sequencing::automation::AutomationEnvelope;
use crate::sequencing::event::{EventKind, SongEvent};
use crate::sequencing::routing::RoutingEdge;
use crate::sequencing::track::TrackKind;
use crate::SAMPLE_RATE;

pub const DEFAULT_TEMPO_BPM: f32 = 120.0;
pub const DEFAULT_DIVISION: f32 = 96.0;

/// A track slot and its initial 16-bit parameter values, id = position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackSpec {
    pub kind: TrackKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<u16>,
}

impl TrackSpec {
    pub fn new(kind: TrackKind, params: Vec<u16>) -> Self {
        Self { kind, params }
    }
}

/// Everything the sequencer needs to play one arrangement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Song {
    /// Starting tempo in BPM.
    #[cfg_attr(feature = "serde", serde(default = "default_tempo"))]
    pub tempo_bpm: f32,
    /// Ticks per quarter note.
    #[cfg_attr(feature = "serde", serde(default = "default_division"))]
    pub division: f32,
    pub tracks: Vec<TrackSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub routing: Vec<RoutingEdge>,
    /// Left and right output, as indices into the per-track stereo
    /// accumulators (`2 * track + channel`).
    pub master: [usize; 2],
    #[cfg_attr(feature = "serde", serde(default))]
    pub automation: Vec<AutomationEnvelope>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub events: Vec<SongEvent>,
}

#[cfg(feature = "serde")]
fn default_tempo() -> f32 {
    DEFAULT_TEMPO_BPM
}

#[cfg(feature = "serde")]
fn default_division() -> f32 {
    DEFAULT_DIVISION
}

/// Samples per tick for a tempo in µs per quarter and a division.
#[inline]
pub fn samples_per_tick(us_per_quarter: f32, division: f32) -> f32 {
    (SAMPLE_RATE / 1_000_000.0) * (us_per_quarter / division)
}

#[inline]
pub fn bpm_to_us_per_quarter(bpm: f32) -> f32 {
    60_000_000.0 / bpm
}

impl Song {
    /// Song without events or routing, heard through both outputs of track
    /// `master`.
    pub fn new(tracks: Vec<TrackSpec>, master: usize) -> Self {
        Self {
            tempo_bpm: DEFAULT_TEMPO_BPM,
            division: DEFAULT_DIVISION,
            tracks,
            routing: Vec::new(),
            master: [2 * master, 2 * master + 1],
            automation: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Check every track reference before playback.
    pub fn validate(&self) -> Result<()> {
        let num_tracks = self.tracks.len();
        if num_tracks == 0 {
            return Err(SynthError::InvalidSong("song has no tracks".into()));
        }
        if !(self.tempo_bpm > 0.0) || !(self.division > 0.0) {
            return Err(SynthError::InvalidSong(format!(
                "tempo {} and division {} must be positive",
                self.tempo_bpm, self.division
            )));
        }
        if let Some(&out) = self.master.iter().find(|&&out| out >= 2 * num_tracks) {
            return Err(SynthError::InvalidSong(format!(
                "master output {} outside {} track outputs",
                out,
                2 * num_tracks
            )));
        }
        for edge in &self.routing {
            if edge.source >= num_tracks {
                return Err(SynthError::UnknownTrack(edge.source));
            }
            if edge.destination >= num_tracks {
                return Err(SynthError::UnknownTrack(edge.destination));
            }
        }
        for env in &self.automation {
            if env.track >= num_tracks {
                return Err(SynthError::UnknownTrack(env.track));
            }
        }
        for (i, event) in self.events.iter().enumerate() {
            if event.delta_ticks < 0 {
                return Err(SynthError::InvalidSong(format!(
                    "event {} has negative delta {}",
                    i, event.delta_ticks
                )));
            }
            let addresses_track = matches!(
                event.kind(),
                Some(
                    EventKind::NoteOn
                        | EventKind::NoteOff
                        | EventKind::PitchBend
                        | EventKind::ParameterChange
                        | EventKind::AllNotesOff
                        | EventKind::StartEnvelope
                )
            );
            if addresses_track && !(0..num_tracks as i64).contains(&(event.channel as i64)) {
                return Err(SynthError::InvalidSong(format!(
                    "event {} addresses missing track {}",
                    i, event.channel
                )));
            }
        }
        Ok(())
    }

    /// Sample index of the last event, following tempo and division changes.
    pub fn length_in_samples(&self) -> u64 {
        let mut us_per_quarter = bpm_to_us_per_quarter(self.tempo_bpm);
        let mut division = self.division;
        let mut at = 0u64;
        for event in &self.events {
            let spt = samples_per_tick(us_per_quarter, division);
            at += (event.delta_ticks.max(0) as f32 * spt).round() as u64;
            match event.kind() {
                Some(EventKind::Tempo) if event.param2 > 0 => {
                    us_per_quarter = bpm_to_us_per_quarter(event.param2 as f32 / 100.0);
                }
                Some(EventKind::Division) if event.param2 > 0 => {
                    division = event.param2 as f32;
                }
                _ => {}
            }
        }
        at
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let song: Song =
            serde_json::from_str(json).map_err(|e| SynthError::InvalidSong(e.to_string()))?;
        song.validate()?;
        Ok(song)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SynthError::InvalidSong(e.to_string()))
    }
}
