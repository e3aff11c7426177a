//! Parameter ids and the mode enums they select.
//!
//! Every control is addressed by a numeric id and set with a normalized
//! value. Ids below [`SynthParam::NUM_USER_PARAMS`] are the patch; the few
//! above it are set by the host (sample rate, pitch wheel).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::math;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SynthParam {
    Osc1Waveform = 0,
    Osc1Semi,
    Osc1Detune,
    Osc1Volume,
    Osc1PulseWidth,
    Osc1Pwm,
    Osc2Waveform,
    Osc2Semi,
    Osc2Detune,
    Osc2Volume,
    Osc2PulseWidth,
    Osc2Pwm,
    Osc3Waveform,
    Osc3Semi,
    Osc3Detune,
    Osc3Volume,
    Osc3PulseWidth,
    Osc3Pwm,
    Lfo1Waveform,
    Lfo1Speed,
    Lfo1StartPhase,
    Lfo1KeyTrack,
    Lfo1ModDest,
    Lfo1ModAmount,
    Lfo2Waveform,
    Lfo2Speed,
    Lfo2StartPhase,
    Lfo2KeyTrack,
    Lfo2ModDest,
    Lfo2ModAmount,
    Lfo3Waveform,
    Lfo3Speed,
    Lfo3StartPhase,
    Lfo3KeyTrack,
    Lfo3ModDest,
    Lfo3ModAmount,
    PitchEnvMod,
    PitchAttack,
    PitchDecay,
    PitchSustain,
    PitchRelease,
    Filter1Mode,
    Filter1Cutoff,
    Filter1Resonance,
    Filter1Drive,
    Filter1KeyTrack,
    Filter1VelMod,
    Filter1EnvMod,
    Filter2Mode,
    Filter2Cutoff,
    Filter2Resonance,
    Filter2Drive,
    Filter2KeyTrack,
    Filter2VelMod,
    Filter2EnvMod,
    FilterAttack,
    FilterDecay,
    FilterSustain,
    FilterRelease,
    AmpEnvVelMod,
    EnvLength,
    FilterRouting,
    PolyMode,
    GlideType,
    GlideTime,
    EnvMode,
    AmpAttack,
    AmpDecay,
    AmpSustain,
    AmpRelease,
    Tempo,
    Pan,
    Filter1OutputLevel,
    Filter2OutputLevel,
    SynthType,
    FmAlgorithm,
    Osc3Feedback,
    Osc1Ratio,
    Osc2Ratio,
    Osc3Ratio,
    SampleRate = 87,
    PitchBend = 88,
}

impl SynthParam {
    pub const NUM_USER_PARAMS: usize = 80;

    pub const USER_PARAMS: [SynthParam; Self::NUM_USER_PARAMS] = [
        Self::Osc1Waveform,
        Self::Osc1Semi,
        Self::Osc1Detune,
        Self::Osc1Volume,
        Self::Osc1PulseWidth,
        Self::Osc1Pwm,
        Self::Osc2Waveform,
        Self::Osc2Semi,
        Self::Osc2Detune,
        Self::Osc2Volume,
        Self::Osc2PulseWidth,
        Self::Osc2Pwm,
        Self::Osc3Waveform,
        Self::Osc3Semi,
        Self::Osc3Detune,
        Self::Osc3Volume,
        Self::Osc3PulseWidth,
        Self::Osc3Pwm,
        Self::Lfo1Waveform,
        Self::Lfo1Speed,
        Self::Lfo1StartPhase,
        Self::Lfo1KeyTrack,
        Self::Lfo1ModDest,
        Self::Lfo1ModAmount,
        Self::Lfo2Waveform,
        Self::Lfo2Speed,
        Self::Lfo2StartPhase,
        Self::Lfo2KeyTrack,
        Self::Lfo2ModDest,
        Self::Lfo2ModAmount,
        Self::Lfo3Waveform,
        Self::Lfo3Speed,
        Self::Lfo3StartPhase,
        Self::Lfo3KeyTrack,
        Self::Lfo3ModDest,
        Self::Lfo3ModAmount,
        Self::PitchEnvMod,
        Self::PitchAttack,
        Self::PitchDecay,
        Self::PitchSustain,
        Self::PitchRelease,
        Self::Filter1Mode,
        Self::Filter1Cutoff,
        Self::Filter1Resonance,
        Self::Filter1Drive,
        Self::Filter1KeyTrack,
        Self::Filter1VelMod,
        Self::Filter1EnvMod,
        Self::Filter2Mode,
        Self::Filter2Cutoff,
        Self::Filter2Resonance,
        Self::Filter2Drive,
        Self::Filter2KeyTrack,
        Self::Filter2VelMod,
        Self::Filter2EnvMod,
        Self::FilterAttack,
        Self::FilterDecay,
        Self::FilterSustain,
        Self::FilterRelease,
        Self::AmpEnvVelMod,
        Self::EnvLength,
        Self::FilterRouting,
        Self::PolyMode,
        Self::GlideType,
        Self::GlideTime,
        Self::EnvMode,
        Self::AmpAttack,
        Self::AmpDecay,
        Self::AmpSustain,
        Self::AmpRelease,
        Self::Tempo,
        Self::Pan,
        Self::Filter1OutputLevel,
        Self::Filter2OutputLevel,
        Self::SynthType,
        Self::FmAlgorithm,
        Self::Osc3Feedback,
        Self::Osc1Ratio,
        Self::Osc2Ratio,
        Self::Osc3Ratio,
    ];

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            87 => Some(Self::SampleRate),
            88 => Some(Self::PitchBend),
            _ => Self::USER_PARAMS.get(id as usize).copied(),
        }
    }

    #[inline]
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Host-driven values that are not normalized and never range-checked.
    pub fn is_unbounded(self) -> bool {
        matches!(self, Self::Tempo | Self::SampleRate | Self::PitchBend)
    }

    /// Which oscillator, LFO or filter a grouped parameter belongs to.
    pub fn slot(self) -> usize {
        let id = self as usize;
        match id {
            0..=17 => id / 6,
            18..=35 => (id - 18) / 6,
            41..=54 => (id - 41) / 7,
            72..=73 => id - 72,
            77..=79 => id - 77,
            _ => 0,
        }
    }
}

impl TryFrom<u16> for SynthParam {
    type Error = u16;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or(id)
    }
}

/// LFO modulation targets.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModDest {
    None,
    Pitch,
    PitchOsc1,
    PitchOsc2,
    PitchOsc3,
    Amp,
    AmpOsc1,
    AmpOsc2,
    AmpOsc3,
    Filter1Cutoff,
    Filter2Cutoff,
    Pwm,
}

impl ModDest {
    pub const ALL: [ModDest; 12] = [
        Self::None,
        Self::Pitch,
        Self::PitchOsc1,
        Self::PitchOsc2,
        Self::PitchOsc3,
        Self::Amp,
        Self::AmpOsc1,
        Self::AmpOsc2,
        Self::AmpOsc3,
        Self::Filter1Cutoff,
        Self::Filter2Cutoff,
        Self::Pwm,
    ];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len()).min(Self::ALL.len() - 1)]
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlideType {
    Off,
    Portamento,
    Glissando,
}

impl GlideType {
    pub const ALL: [GlideType; 3] = [Self::Off, Self::Portamento, Self::Glissando];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len()).min(Self::ALL.len() - 1)]
    }
}

/// Subtractive, or one of the six FM operator wirings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthType {
    Subtractive,
    FmAlgo1,
    FmAlgo2,
    FmAlgo3,
    FmAlgo4,
    FmAlgo5,
    FmAlgo6,
}

impl SynthType {
    pub const ALL: [SynthType; 7] = [
        Self::Subtractive,
        Self::FmAlgo1,
        Self::FmAlgo2,
        Self::FmAlgo3,
        Self::FmAlgo4,
        Self::FmAlgo5,
        Self::FmAlgo6,
    ];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len()).min(Self::ALL.len() - 1)]
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyMode {
    Poly,
    Mono,
    Legato,
}

impl PolyMode {
    pub const ALL: [PolyMode; 3] = [Self::Poly, Self::Mono, Self::Legato];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len()).min(Self::ALL.len() - 1)]
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRouting {
    Serial,
    Parallel,
}

impl FilterRouting {
    pub fn from_normalized(value: f32) -> Self {
        if math::selector(value, 2) == 0 {
            Self::Serial
        } else {
            Self::Parallel
        }
    }
}

/// Normalized value that selects `index` out of `count` choices.
pub fn normalized_choice(index: usize, count: usize) -> f32 {
    if count < 2 {
        0.0
    } else {
        index as f32 / (count - 1) as f32
    }
}
