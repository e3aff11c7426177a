use crate::dsp::half_band::Oversampler;
use crate::dsp::math;
use crate::effects::StereoEffect;
use crate::error::{normalize_param, Result};

const TANH_COEFF: f32 = 30.0;
const CLIP_COEFF: f32 = 10.0;
const WRAP_COEFF: f32 = 10.0;
const FOLDBACK_COEFF: f32 = 10.0;
const POST_GAIN_COEFF: f32 = 10.0;
/// Longest sample-and-hold period in samples, reached at full drive.
const HOLD_PERIOD_MAX: f32 = 440.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistortionMode {
    /// Shaper outputs silence; only the dry share of the mix is heard.
    #[default]
    Off,
    Tanh,
    Clip,
    Wrap,
    Foldback,
    BitDepth,
    SampleRate,
    PassThrough,
}

impl DistortionMode {
    pub const ALL: [DistortionMode; 8] = [
        DistortionMode::Off,
        DistortionMode::Tanh,
        DistortionMode::Clip,
        DistortionMode::Wrap,
        DistortionMode::Foldback,
        DistortionMode::BitDepth,
        DistortionMode::SampleRate,
        DistortionMode::PassThrough,
    ];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len())]
    }
}

/// Fixed and selectable modes share the same half-band chain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OversamplingMode {
    #[default]
    Off,
    X2,
    X4,
    X8,
    FixedX2,
    FixedX4,
    FixedX8,
}

impl OversamplingMode {
    pub const ALL: [OversamplingMode; 7] = [
        OversamplingMode::Off,
        OversamplingMode::X2,
        OversamplingMode::X4,
        OversamplingMode::X8,
        OversamplingMode::FixedX2,
        OversamplingMode::FixedX4,
        OversamplingMode::FixedX8,
    ];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len())]
    }

    /// Number of ×2 stages.
    pub fn stages(self) -> usize {
        match self {
            OversamplingMode::Off => 0,
            OversamplingMode::X2 | OversamplingMode::FixedX2 => 1,
            OversamplingMode::X4 | OversamplingMode::FixedX4 => 2,
            OversamplingMode::X8 | OversamplingMode::FixedX8 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum DistortionParam {
    Mode = 0,
    Mix,
    Drive,
    PostGain,
    Oversampling = 10,
    SampleRate = 12,
    Tempo = 13,
}

impl DistortionParam {
    pub const NUM_USER_PARAMS: usize = 4;

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0 => Some(Self::Mode),
            1 => Some(Self::Mix),
            2 => Some(Self::Drive),
            3 => Some(Self::PostGain),
            10 => Some(Self::Oversampling),
            12 => Some(Self::SampleRate),
            13 => Some(Self::Tempo),
            _ => None,
        }
    }
}

/// Per-channel shaper memory; only the sample-and-hold mode uses it.
#[derive(Debug, Default, Clone, Copy)]
struct Shaper {
    counter: i32,
    held: f32,
}

impl Shaper {
    fn shape(&mut self, input: f32, mode: DistortionMode, drive: f32) -> f32 {
        match mode {
            DistortionMode::Off => 0.0,
            DistortionMode::Tanh => math::tanh(input * (1.0 + TANH_COEFF * drive)),
            DistortionMode::Clip => math::clamp1(drive * CLIP_COEFF * input),
            DistortionMode::Wrap => wrap(drive * WRAP_COEFF * input),
            DistortionMode::Foldback => math::sin(input * FOLDBACK_COEFF * drive),
            DistortionMode::BitDepth => {
                let scale = ((1.0 - drive) * 16.0).exp2();
                (input * scale) as i32 as f32 / scale
            }
            DistortionMode::SampleRate => {
                self.counter -= 1;
                if self.counter <= 0 {
                    self.held = input;
                    self.counter = (drive * HOLD_PERIOD_MAX) as i32;
                }
                self.held
            }
            DistortionMode::PassThrough => input,
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Fold a value into [-1, 1] by whole steps of 2.
#[inline]
fn wrap(value: f32) -> f32 {
    if (-1.0..=1.0).contains(&value) {
        return value;
    }
    let folded = (value + 1.0).rem_euclid(2.0) - 1.0;
    // rem_euclid maps +1 overshoot onto -1; keep the sign of the input.
    if folded == -1.0 && value > 0.0 {
        1.0
    } else {
        folded
    }
}

#[derive(Debug, Clone)]
struct Channel {
    oversampler: Oversampler,
    shaper: Shaper,
}

/// Waveshaper with optional half-band oversampling.
///
/// ```text
/// out = post_gain · 10 · ((1 − mix) · in + mix · shape(in))
/// ```
#[derive(Debug, Clone)]
pub struct Distortion {
    mode: DistortionMode,
    oversampling: OversamplingMode,
    mix: f32,
    drive: f32,
    post_gain: f32,
    channels: [Channel; 2],
}

impl Distortion {
    pub fn new() -> Self {
        let channel = Channel {
            oversampler: Oversampler::new(0),
            shaper: Shaper::default(),
        };
        Self {
            mode: DistortionMode::Off,
            oversampling: OversamplingMode::Off,
            mix: 0.5,
            drive: 0.0,
            post_gain: 0.5,
            channels: [channel.clone(), channel],
        }
    }

    pub fn mode(&self) -> DistortionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DistortionMode) {
        self.mode = mode;
        self.clear();
    }

    pub fn oversampling(&self) -> OversamplingMode {
        self.oversampling
    }

    pub fn set_oversampling(&mut self, oversampling: OversamplingMode) {
        self.oversampling = oversampling;
        for channel in &mut self.channels {
            channel.oversampler.set_stages(oversampling.stages());
        }
        self.clear();
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix;
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.drive = drive;
    }

    pub fn set_post_gain(&mut self, post_gain: f32) {
        self.post_gain = post_gain;
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoEffect for Distortion {
    fn set_parameter(&mut self, id: u16, value: f32) -> Result<()> {
        let Some(param) = DistortionParam::from_id(id) else {
            return Ok(());
        };
        if matches!(param, DistortionParam::SampleRate | DistortionParam::Tempo) {
            return Ok(());
        }

        let value = normalize_param(id, value)?;
        match param {
            DistortionParam::Mode => self.set_mode(DistortionMode::from_normalized(value)),
            DistortionParam::Mix => self.set_mix(value),
            DistortionParam::Drive => self.set_drive(value),
            DistortionParam::PostGain => self.set_post_gain(value),
            DistortionParam::Oversampling => {
                self.set_oversampling(OversamplingMode::from_normalized(value))
            }
            DistortionParam::SampleRate | DistortionParam::Tempo => {}
        }
        Ok(())
    }

    fn process(&mut self, input: [f32; 2]) -> [f32; 2] {
        let (mode, drive) = (self.mode, self.drive);
        let gain = self.post_gain * POST_GAIN_COEFF;

        let mut out = [0.0; 2];
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let Channel {
                oversampler,
                shaper,
            } = channel;
            let shaped = oversampler.process(input[ch], |x| shaper.shape(x, mode, drive));
            out[ch] = gain * ((1.0 - self.mix) * input[ch] + self.mix * shaped);
        }
        out
    }

    fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.oversampler.clear();
            channel.shaper.clear();
        }
    }
}
