use crate::effects::{Chorus, Distortion, Echo, Reverb, StereoEffect, StereoFilter};
use crate::error::Result;
use crate::io::samples::SampleBanks;
use crate::synth::{PolyHandler, SynthParam};

/// Processor type of a track, as stored in a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrackKind {
    Instrument,
    Distortion,
    Chorus,
    Echo,
    Reverb,
    StereoFilter,
}

/// One mixer slot and the processor it owns.
#[derive(Debug, Clone)]
pub enum Track {
    Instrument(PolyHandler),
    Distortion(Distortion),
    Chorus(Chorus),
    Echo(Echo),
    Reverb(Reverb),
    StereoFilter(StereoFilter),
}

impl Track {
    pub fn new(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Instrument => Track::Instrument(PolyHandler::new()),
            TrackKind::Distortion => Track::Distortion(Distortion::new()),
            TrackKind::Chorus => Track::Chorus(Chorus::new()),
            TrackKind::Echo => Track::Echo(Echo::new()),
            TrackKind::Reverb => Track::Reverb(Reverb::new()),
            TrackKind::StereoFilter => Track::StereoFilter(StereoFilter::new()),
        }
    }

    /// Build a track and load its stored 16-bit parameters.
    pub fn with_params(kind: TrackKind, params: &[u16]) -> Result<Self> {
        let mut track = Self::new(kind);
        match &mut track {
            Track::Instrument(poly) => poly.init(params)?,
            other => {
                if let Some(effect) = other.effect_mut() {
                    effect.init(params)?;
                }
            }
        }
        Ok(track)
    }

    pub fn kind(&self) -> TrackKind {
        match self {
            Track::Instrument(_) => TrackKind::Instrument,
            Track::Distortion(_) => TrackKind::Distortion,
            Track::Chorus(_) => TrackKind::Chorus,
            Track::Echo(_) => TrackKind::Echo,
            Track::Reverb(_) => TrackKind::Reverb,
            Track::StereoFilter(_) => TrackKind::StereoFilter,
        }
    }

    pub fn instrument_mut(&mut self) -> Option<&mut PolyHandler> {
        match self {
            Track::Instrument(poly) => Some(poly),
            _ => None,
        }
    }

    fn effect_mut(&mut self) -> Option<&mut dyn StereoEffect> {
        match self {
            Track::Instrument(_) => None,
            Track::Distortion(fx) => Some(fx),
            Track::Chorus(fx) => Some(fx),
            Track::Echo(fx) => Some(fx),
            Track::Reverb(fx) => Some(fx),
            Track::StereoFilter(fx) => Some(fx),
        }
    }

    pub fn set_parameter(&mut self, id: u16, value: f32) -> Result<()> {
        match self {
            Track::Instrument(poly) => poly.set_parameter(id, value),
            other => match other.effect_mut() {
                Some(effect) => effect.set_parameter(id, value),
                None => Ok(()),
            },
        }
    }

    /// Tempo only reaches instruments. The echo's tempo id is accepted and
    /// ignored, so no effect needs it.
    pub fn set_tempo(&mut self, bpm: f32) -> Result<()> {
        match self {
            Track::Instrument(poly) => poly.set_parameter(SynthParam::Tempo.id(), bpm),
            _ => Ok(()),
        }
    }

    /// Render one frame in place.
    ///
    /// Instruments overwrite `frame` with their own output. Effects read the
    /// signal routed into `frame` and replace it with the processed result.
    #[inline]
    pub fn render(&mut self, frame: &mut [f32; 2], banks: &SampleBanks) {
        match self {
            Track::Instrument(poly) => {
                let (left, right) = poly.next_sample(banks);
                *frame = [left, right];
            }
            Track::Distortion(fx) => *frame = fx.process(*frame),
            Track::Chorus(fx) => *frame = fx.process(*frame),
            Track::Echo(fx) => *frame = fx.process(*frame),
            Track::Reverb(fx) => *frame = fx.process(*frame),
            Track::StereoFilter(fx) => *frame = fx.process(*frame),
        }
    }
}
