//! Oscillator waveforms and noise sources.
//!
//! One oscillator type serves both as an audio-rate tone generator and as a
//! control-rate LFO. The two modes differ only in how `pitch` maps to Hz and
//! how pitch modulation enters the phase increment.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::math::{self, PI, SEMITONE_DOWN, SEMITONE_UP, TAU};
use crate::io::samples::{SampleBanks, MAX_SAMPLE_SLOT};
use crate::SAMPLE_RATE;

/// Highest pitch an audio-rate oscillator accepts, in Hz.
pub const OSC_MAX_FREQ: f32 = 20_000.0;
/// Highest LFO rate in Hz.
pub const LFO_MAX_FREQ: f32 = 250.0;
/// Coarse tuning range in semitones, either direction.
pub const SEMI_RANGE: f32 = 60.0;

const FINE_DETUNE_UP: f32 = SEMITONE_UP - 1.0;
const NOISE_SEED_A: i32 = 0x6745_2301;
const NOISE_SEED_C: i32 = 0xefcd_ab89_u32 as i32;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    BlepSaw,
    BlepSquare,
    BlepPulse,
    Noise,
    SampleAndHold,
    RawSaw,
    RawSquare,
    RawPulse,
    RawTriangle,
    Off,
    SamplePlayback,
}

impl OscillatorWaveform {
    pub const ALL: [OscillatorWaveform; 12] = [
        Self::Sine,
        Self::BlepSaw,
        Self::BlepSquare,
        Self::BlepPulse,
        Self::Noise,
        Self::SampleAndHold,
        Self::RawSaw,
        Self::RawSquare,
        Self::RawPulse,
        Self::RawTriangle,
        Self::Off,
        Self::SamplePlayback,
    ];

    /// Waveform selected by a normalized parameter value.
    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len()).min(Self::ALL.len() - 1)]
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorMode {
    Audio,
    Lfo,
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    mode: OscillatorMode,
    waveform: OscillatorWaveform,
    active: bool,

    phase: f32,
    start_phase: f32,
    sync: bool,
    increment: f32,

    pitch: f32,
    pitch_bend: f32,
    pitch_mod: f32,
    phase_mod: f32,
    detune: f32,
    semi: f32,
    volume: f32,

    pulse_width: f32,
    pwm: f32,
    pulse_width_mod: f32,

    noise_a: i32,
    noise_c: i32,
    held_sample: f32,
    hold_period: i32,
    hold_counter: i32,

    sample_slot: usize,
    sample_pos: f32,
}

impl Oscillator {
    pub fn new(mode: OscillatorMode) -> Self {
        let mut osc = Self {
            mode,
            waveform: OscillatorWaveform::Sine,
            active: false,
            phase: 0.0,
            start_phase: 0.0,
            sync: true,
            increment: 0.0,
            pitch: 440.0,
            pitch_bend: 1.0,
            pitch_mod: 0.0,
            phase_mod: 0.0,
            detune: 1.0,
            semi: 1.0,
            volume: 1.0,
            pulse_width: 0.0,
            pwm: 0.0,
            pulse_width_mod: 0.0,
            noise_a: NOISE_SEED_A,
            noise_c: NOISE_SEED_C,
            held_sample: 0.0,
            hold_period: 1,
            hold_counter: 0,
            sample_slot: 0,
            sample_pos: 0.0,
        };
        osc.set_detune(0.5);
        osc.set_semi(0.5);
        osc.set_pulse_width(0.5);
        osc
    }

    pub fn audio() -> Self {
        Self::new(OscillatorMode::Audio)
    }

    /// Sine LFO triggered at `rate` (normalized speed).
    pub fn lfo(rate: f32) -> Self {
        let mut osc = Self::new(OscillatorMode::Lfo);
        osc.trigger_at(rate);
        osc
    }

    pub fn mode(&self) -> OscillatorMode {
        self.mode
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_waveform(&mut self, value: f32) {
        self.set_waveform_kind(OscillatorWaveform::from_normalized(value));
    }

    pub fn set_waveform_kind(&mut self, waveform: OscillatorWaveform) {
        self.waveform = waveform;
        self.held_sample = 0.0;
    }

    /// Audio mode: pitch in Hz. LFO mode: normalized speed folded onto
    /// [0, 250] Hz from either half of the range.
    pub fn set_pitch(&mut self, pitch: f32) {
        match self.mode {
            OscillatorMode::Audio => {
                self.pitch = math::clamp(pitch, -OSC_MAX_FREQ, OSC_MAX_FREQ);
                self.hold_period = (OSC_MAX_FREQ / (self.pitch + 0.1)) as i32;
            }
            OscillatorMode::Lfo => {
                let folded = if pitch < 0.5 {
                    pitch * 2.0
                } else {
                    pitch * 2.0 - 1.0
                };
                self.pitch = LFO_MAX_FREQ * math::clamp01(folded);
                self.hold_period = (LFO_MAX_FREQ / (self.pitch + 1.0)) as i32;
            }
        }
    }

    /// Bend factor as a frequency ratio.
    pub fn set_pitch_bend(&mut self, bend: f32) {
        self.pitch_bend = bend;
    }

    pub fn set_pitch_mod(&mut self, amount: f32) {
        self.pitch_mod = math::clamp1(amount);
    }

    pub fn set_phase_mod(&mut self, amount: f32) {
        self.phase_mod = math::clamp1(amount);
    }

    /// ±1 semitone fine tuning, 0.5 is centre.
    pub fn set_detune(&mut self, detune: f32) {
        self.detune = if detune >= 0.5 {
            (2.0 * detune - 1.0) * FINE_DETUNE_UP + 1.0
        } else {
            2.0 * detune * FINE_DETUNE_UP + SEMITONE_DOWN
        };
    }

    /// ±60 semitones quantized to whole steps, 0.5 is centre.
    pub fn set_semi(&mut self, semi: f32) {
        self.semi = if semi >= 0.5 {
            SEMITONE_UP.powi(math::clrintf((semi - 0.5) * 2.0 * SEMI_RANGE))
        } else {
            SEMITONE_DOWN.powi(math::clrintf((0.5 - semi) * 2.0 * SEMI_RANGE))
        };
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    pub fn set_pulse_width(&mut self, pw: f32) {
        self.pulse_width = TAU * pw;
    }

    pub fn set_pwm(&mut self, pwm: f32) {
        self.pwm = pwm;
    }

    /// Pulse width offset driven by an LFO, scaled by the `pwm` depth.
    pub fn set_pulse_width_mod(&mut self, value: f32) {
        let mut offset = TAU * self.pwm * value;
        if offset > TAU {
            offset -= TAU;
        }
        if offset < 0.0 {
            offset += TAU;
        }
        self.pulse_width_mod = offset;
    }

    /// LFO mode: values below 0.5 restart at the start phase on every
    /// trigger, values above run free.
    pub fn set_start_phase(&mut self, value: f32) {
        match self.mode {
            OscillatorMode::Lfo => {
                if value < 0.5 {
                    self.sync = true;
                    self.start_phase = TAU * value * 2.0;
                } else {
                    self.sync = false;
                    self.start_phase = TAU * (value - 0.5) * 2.0;
                }
            }
            OscillatorMode::Audio => {
                self.start_phase = TAU * value;
            }
        }
    }

    /// Sample bank slot for the playback waveform.
    pub fn set_sample_slot(&mut self, slot: u8) {
        self.sample_slot = (slot as usize).min(MAX_SAMPLE_SLOT);
    }

    pub fn trigger(&mut self) {
        if self.sync {
            self.phase = self.start_phase;
        }
        self.active = true;
        self.sample_pos = 0.0;
    }

    pub fn trigger_at(&mut self, pitch: f32) {
        self.set_pitch(pitch);
        self.trigger();
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    #[inline]
    fn calculate_increment(&mut self) {
        self.increment = match self.mode {
            OscillatorMode::Lfo => self.pitch * TAU / SAMPLE_RATE,
            OscillatorMode::Audio => {
                self.pitch
                    * self.pitch_bend
                    * (1.0 + self.pitch_mod)
                    * self.detune
                    * self.semi
                    * TAU
                    / SAMPLE_RATE
            }
        };
    }

    /// PolyBLEP residual, one increment wide on either side of a step.
    #[inline]
    fn poly_blep(&self, mut t: f32) -> f32 {
        let dt = self.increment / TAU;
        if t < dt {
            t /= dt;
            t + t - t * t - 1.0
        } else if t > 1.0 - dt {
            t = (t - 1.0) / dt;
            t * t + t + t + 1.0
        } else {
            0.0
        }
    }

    #[inline]
    fn next_noise(&mut self) -> f32 {
        self.noise_a ^= self.noise_c;
        let out = self.noise_c as f32 / i32::MAX as f32;
        self.noise_c = self.noise_c.wrapping_add(self.noise_a);
        out
    }

    #[inline]
    fn naive_saw(&self) -> f32 {
        self.phase / PI - 1.0
    }

    #[inline]
    fn pulse_offset(&self) -> f32 {
        (TAU - (self.phase + self.pulse_width + self.pulse_width_mod) % TAU) / PI - 1.0
    }

    #[inline]
    fn naive_square(&self) -> f32 {
        if self.phase < PI {
            1.0
        } else {
            -1.0
        }
    }

    fn blep_saw(&self) -> f32 {
        self.naive_saw() - self.poly_blep(self.phase / TAU)
    }

    /// Produce the next sample and advance the phase. Silent until triggered.
    pub fn next_sample(&mut self, banks: &SampleBanks) -> f32 {
        if !self.active {
            return 0.0;
        }

        self.calculate_increment();

        let out = match self.waveform {
            OscillatorWaveform::Sine => math::sin(self.phase),
            OscillatorWaveform::BlepSaw => self.blep_saw(),
            OscillatorWaveform::BlepSquare => {
                let t = self.phase / TAU;
                self.naive_square() + self.poly_blep(t) - self.poly_blep((t + 0.5) % 1.0)
            }
            OscillatorWaveform::BlepPulse => self.blep_saw() + self.pulse_offset(),
            OscillatorWaveform::Noise => self.next_noise(),
            OscillatorWaveform::SampleAndHold => {
                let value = self.next_noise();
                let out = if self.hold_counter < 0 {
                    self.held_sample = value;
                    self.hold_counter = self.hold_period;
                    value
                } else {
                    self.held_sample
                };
                self.hold_counter -= 1;
                out
            }
            OscillatorWaveform::RawSaw => self.naive_saw(),
            OscillatorWaveform::RawSquare => self.naive_square(),
            OscillatorWaveform::RawPulse => self.naive_saw() + self.pulse_offset(),
            OscillatorWaveform::RawTriangle => 2.0 * ((self.phase / PI - 1.0).abs() - 0.5),
            OscillatorWaveform::Off => 0.0,
            OscillatorWaveform::SamplePlayback => self.next_playback_sample(banks),
        };

        match self.mode {
            OscillatorMode::Lfo => self.phase += self.increment * (1.0 + self.pitch_mod),
            OscillatorMode::Audio => self.phase += self.increment + self.phase_mod * PI,
        }

        // Repeated wrap tolerates large single-step phase modulation.
        while self.phase > TAU {
            self.phase -= TAU;
        }
        while self.phase < 0.0 {
            self.phase += TAU;
        }

        out * self.volume
    }

    fn next_playback_sample(&mut self, banks: &SampleBanks) -> f32 {
        let bank = banks.slot(self.sample_slot);
        if bank.is_empty() {
            return 0.0;
        }

        let index = (self.sample_pos.max(0.0) as usize).min(bank.len() - 1);
        let out = bank[index];

        // Playback speed relative to A4.
        self.sample_pos += (self.increment / (TAU / SAMPLE_RATE)) / 440.0;
        self.sample_pos %= bank.len() as f32;
        out
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::audio()
    }
}
