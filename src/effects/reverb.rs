//! Plate reverb after Dattorro's figure-of-eight tank.
//!
//! The input is summed to mono, predelayed, band-limited and diffused by four
//! allpasses, then fed into two cross-coupled tanks. Each tank runs an
//! inverted allpass, a delay, a damping lowpass and a second allpass and
//! delay, and feeds the other tank scaled by the decay gain. The stereo
//! output is a fixed set of seven taps per side.
//!
//! All lengths are given at the 29761 Hz reference rate of Dattorro's paper
//! and scaled to the engine rate.

use crate::dsp::delay::{AllPass, DelayLine};
use crate::dsp::filter::SVFilter;
use crate::dsp::math;
use crate::effects::{blend, StereoEffect};
use crate::error::{normalize_param, Result};
use crate::SAMPLE_RATE;

const REFERENCE_RATE: f32 = 29_761.0;

const PREDELAY_LEN: f32 = 221.0;
const APF1_LEN: f32 = 142.0;
const APF2_LEN: f32 = 107.0;
const APF3_LEN: f32 = 379.0;
const APF4_LEN: f32 = 277.0;
const MOD_APF1_LEN: f32 = 672.0;
const MOD_APF2_LEN: f32 = 908.0;
const APF5_LEN: f32 = 1_800.0;
const APF6_LEN: f32 = 2_656.0;
const DELAY1_LEN: f32 = 4_453.0;
const DELAY2_LEN: f32 = 3_720.0;
const DELAY3_LEN: f32 = 4_217.0;
const DELAY4_LEN: f32 = 3_163.0;

const INPUT_DIFFUSION_1: f32 = 0.75;
const INPUT_DIFFUSION_2: f32 = 0.625;
const DECAY_DIFFUSION_1: f32 = 0.5;
const DECAY_DIFFUSION_2: f32 = 0.7;

const TAP_GAIN: f32 = 0.6;

/// Where an output tap reads from.
#[derive(Debug, Clone, Copy)]
enum TapSource {
    Delay1,
    Delay2,
    Delay3,
    Delay4,
    Apf5,
    Apf6,
}

/// (source, offset at the reference rate, sign)
type Tap = (TapSource, f32, f32);

const LEFT_TAPS: [Tap; 7] = [
    (TapSource::Delay3, 266.0, 1.0),
    (TapSource::Delay3, 2_974.0, 1.0),
    (TapSource::Apf6, 1_913.0, -1.0),
    (TapSource::Delay4, 1_996.0, 1.0),
    (TapSource::Delay1, 1_990.0, 1.0),
    (TapSource::Apf5, 187.0, -1.0),
    (TapSource::Delay2, 1_066.0, -1.0),
];

const RIGHT_TAPS: [Tap; 7] = [
    (TapSource::Delay1, 353.0, 1.0),
    (TapSource::Delay1, 3_627.0, 1.0),
    (TapSource::Apf5, 1_228.0, -1.0),
    (TapSource::Delay2, 2_673.0, 1.0),
    (TapSource::Delay3, 2_111.0, -1.0),
    (TapSource::Apf6, 335.0, -1.0),
    (TapSource::Delay4, 121.0, -1.0),
];

/// Reference-rate length scaled to the engine rate.
#[inline]
fn scaled(length: f32, factor: f32) -> usize {
    math::clrintf(length / REFERENCE_RATE * SAMPLE_RATE * factor).max(1) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReverbParam {
    Mix = 0,
    PreDelay,
    Bandwidth,
    Damping,
    Decay,
    RoomSize,
    SampleRate = 13,
}

impl ReverbParam {
    pub const NUM_USER_PARAMS: usize = 6;

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0 => Some(Self::Mix),
            1 => Some(Self::PreDelay),
            2 => Some(Self::Bandwidth),
            3 => Some(Self::Damping),
            4 => Some(Self::Decay),
            5 => Some(Self::RoomSize),
            13 => Some(Self::SampleRate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reverb {
    mix: f32,
    decay: f32,
    room_size: f32,

    predelay: DelayLine,
    bandwidth: SVFilter,
    input_apfs: [AllPass; 4],

    mod_apf1: AllPass,
    delay1: DelayLine,
    damping1: SVFilter,
    apf5: AllPass,
    delay2: DelayLine,

    mod_apf2: AllPass,
    delay3: DelayLine,
    damping2: SVFilter,
    apf6: AllPass,
    delay4: DelayLine,

    feedback_left: f32,
    feedback_right: f32,
}

impl Reverb {
    pub fn new() -> Self {
        let room_size = 0.5;

        let input_apfs = [
            (APF1_LEN, INPUT_DIFFUSION_1),
            (APF2_LEN, INPUT_DIFFUSION_1),
            (APF3_LEN, INPUT_DIFFUSION_2),
            (APF4_LEN, INPUT_DIFFUSION_2),
        ]
        .map(|(length, gain)| {
            let mut apf = AllPass::new();
            apf.set_length(scaled(length, 1.0));
            apf.set_feedback(gain);
            apf
        });

        let decay_apf = |gain: f32, invert: bool| {
            let mut apf = AllPass::new();
            apf.set_feedback(gain);
            apf.set_invert(invert);
            apf
        };

        let mut reverb = Self {
            mix: 0.5,
            decay: 0.5,
            room_size,
            predelay: DelayLine::with_length(scaled(PREDELAY_LEN, 1.0)),
            bandwidth: SVFilter::lowpass(0.9995),
            input_apfs,
            mod_apf1: decay_apf(DECAY_DIFFUSION_1, true),
            delay1: DelayLine::with_length(scaled(DELAY1_LEN, room_size)),
            damping1: SVFilter::lowpass(1.0),
            apf5: decay_apf(DECAY_DIFFUSION_2, false),
            delay2: DelayLine::with_length(scaled(DELAY2_LEN, room_size)),
            mod_apf2: decay_apf(DECAY_DIFFUSION_1, true),
            delay3: DelayLine::with_length(scaled(DELAY3_LEN, room_size)),
            damping2: SVFilter::lowpass(1.0),
            apf6: decay_apf(DECAY_DIFFUSION_2, false),
            delay4: DelayLine::with_length(scaled(DELAY4_LEN, room_size)),
            feedback_left: 0.0,
            feedback_right: 0.0,
        };
        reverb.set_damping(0.0005);
        reverb.set_room_size(room_size);
        reverb
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix;
    }

    /// Predelay as a fraction of the two second buffer.
    pub fn set_predelay(&mut self, predelay: f32) {
        self.predelay.set_time(predelay);
    }

    pub fn set_bandwidth(&mut self, bandwidth: f32) {
        self.bandwidth.set_cutoff(bandwidth);
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.damping1.set_cutoff(1.0 - damping);
        self.damping2.set_cutoff(1.0 - damping);
    }

    pub fn set_decay(&mut self, decay: f32) {
        self.decay = decay;
    }

    /// Resizes the decay diffusers only; the tank delays keep their length.
    pub fn set_room_size(&mut self, room_size: f32) {
        self.room_size = room_size;
        self.mod_apf1.set_length(scaled(MOD_APF1_LEN, room_size));
        self.mod_apf2.set_length(scaled(MOD_APF2_LEN, room_size));
        self.apf5.set_length(scaled(APF5_LEN, room_size));
        self.apf6.set_length(scaled(APF6_LEN, room_size));
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    fn tap(&self, (source, offset, sign): Tap) -> f32 {
        let delay = scaled(offset, 1.0) as i32;
        let sample = match source {
            TapSource::Delay1 => self.delay1.delayed_by(delay),
            TapSource::Delay2 => self.delay2.delayed_by(delay),
            TapSource::Delay3 => self.delay3.delayed_by(delay),
            TapSource::Delay4 => self.delay4.delayed_by(delay),
            TapSource::Apf5 => self.apf5.delayed_by(delay),
            TapSource::Apf6 => self.apf6.delayed_by(delay),
        };
        sign * TAP_GAIN * sample
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoEffect for Reverb {
    fn set_parameter(&mut self, id: u16, value: f32) -> Result<()> {
        let Some(param) = ReverbParam::from_id(id) else {
            return Ok(());
        };
        if param == ReverbParam::SampleRate {
            return Ok(());
        }

        let value = normalize_param(id, value)?;
        match param {
            ReverbParam::Mix => self.set_mix(value),
            ReverbParam::PreDelay => self.set_predelay(value),
            ReverbParam::Bandwidth => self.set_bandwidth(value),
            ReverbParam::Damping => self.set_damping(value),
            ReverbParam::Decay => self.set_decay(value),
            ReverbParam::RoomSize => self.set_room_size(value),
            ReverbParam::SampleRate => {}
        }
        Ok(())
    }

    fn process(&mut self, input: [f32; 2]) -> [f32; 2] {
        let mut diffused = (input[0] + input[1]) * 0.5;
        math::add_dc(&mut diffused);
        diffused = self.predelay.process(diffused);
        diffused = self.bandwidth.process(diffused);
        for apf in &mut self.input_apfs {
            diffused = apf.process(diffused);
        }

        self.feedback_right += diffused;
        self.feedback_left += diffused;

        let mut left = self.mod_apf1.process(self.feedback_right);
        left = self.delay1.process(left);
        left = self.damping1.process(left) * self.decay;
        math::add_dc(&mut left);
        left = self.apf5.process(left);
        left = self.delay2.process(left);

        let mut right = self.mod_apf2.process(self.feedback_left);
        right = self.delay3.process(right);
        right = self.damping2.process(right) * self.decay;
        math::add_dc(&mut right);
        right = self.apf6.process(right);
        right = self.delay4.process(right);

        self.feedback_left = left * self.decay;
        self.feedback_right = right * self.decay;
        math::add_dc(&mut self.feedback_left);
        math::add_dc(&mut self.feedback_right);

        let wet_left: f32 = LEFT_TAPS.iter().map(|&tap| self.tap(tap)).sum();
        let wet_right: f32 = RIGHT_TAPS.iter().map(|&tap| self.tap(tap)).sum();

        [
            blend(input[0], wet_left, self.mix),
            blend(input[1], wet_right, self.mix),
        ]
    }

    fn clear(&mut self) {
        self.predelay.clear();
        self.input_apfs.iter_mut().for_each(AllPass::clear);
        for apf in [
            &mut self.mod_apf1,
            &mut self.mod_apf2,
            &mut self.apf5,
            &mut self.apf6,
        ] {
            apf.clear();
        }
        for line in [
            &mut self.delay1,
            &mut self.delay2,
            &mut self.delay3,
            &mut self.delay4,
        ] {
            line.clear();
        }
        self.bandwidth.reset();
        self.damping1.reset();
        self.damping2.reset();
        self.feedback_left = 0.0;
        self.feedback_right = 0.0;
    }
}
