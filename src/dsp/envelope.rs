use crate::dsp::math;
use crate::SAMPLE_RATE;

/*
ADSR Envelope Generator
=======================

Drives amplitude, filter cutoff and pitch over the life of a note.

Vocabulary
----------

  value       Current output (0.0 to 1.0).

  stage       Off, Attack, Decay, Sustain or Release.

  length      Global time scale in seconds. Attack, decay and release are
              fractions of it, so one knob stretches the whole envelope.

  mode        Linear ramps, or exponential curves with a "digital" or
              "analog" target overshoot (TCO).


The Shapes
----------

  Linear                      Exponential (analog)

    1.0 ┐   ╱╲                  1.0 ┐  ╭╮
        │  ╱  ╲______             │ ╱  ╲_______
    S   │ ╱          ╲            S │╱           ╲
    0.0 └╱────────────╲──→      0.0 └─────────────╲___→

Linear mode adds a fixed step per sample:

    step = 1 / ((0.001 + 0.999 · time) · length · sample_rate)

Exponential modes run a one-pole toward a target just past the end point:

    coeff  = exp(−ln((1 + tco) / tco) / samples)
    offset = (1 + tco) · (1 − coeff)           attack only
    value  = offset + value · coeff            attack
    value  = value · coeff                     decay / release

A small TCO (digital) gives nearly straight exponentials; the analog TCO
gives the familiar RC-charging attack.


The State Machine
-----------------

   ┌─────┐ trigger ┌────────┐ value≥1 ┌───────┐ value≤S ┌─────────┐
   │ Off │ ──────→ │ Attack │ ──────→ │ Decay │ ──────→ │ Sustain │
   └─────┘         └────────┘         └───────┘         └─────────┘
      ↑                 │ stop            │ stop             │ stop
      │                 ↓                 ↓                  ↓
      │            ┌─────────────────────────────────────────────┐
      └─────────── │ Release (from the current value)            │
        value<0.01 └─────────────────────────────────────────────┘

A quick stop releases in roughly two milliseconds of the envelope length
(linear) or multiplies by 0.2 per sample (exponential). Voice stealing uses
it to free a voice without a click.
*/

/// Upper bound of the envelope length parameter, in seconds.
pub const ENV_LENGTH_MAX: f32 = 10.0;

const QUICK_RELEASE_COEFF: f32 = 0.2;
const RELEASE_FLOOR: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Off,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Linear,
    Digital,
    Analog,
}

impl EnvMode {
    pub const ALL: [EnvMode; 3] = [Self::Linear, Self::Digital, Self::Analog];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len()).min(Self::ALL.len() - 1)]
    }

    /// Target overshoots for (attack, decay, release).
    fn tco(self) -> (f32, f32, f32) {
        match self {
            EnvMode::Linear => (1.0, 1.0, 1.0),
            EnvMode::Digital => (0.000_015_848_926, 0.000_015_848_926, 0.000_015_848_926),
            EnvMode::Analog => (0.606_530_66, 0.006_737_947, 0.006_737_947),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    // Shape, all normalized except length (seconds)
    length: f32,
    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,
    mode: EnvMode,

    stage: EnvelopeStage,
    value: f32,
    step: f32,
    quick_release: bool,

    attack_coeff: f32,
    attack_offset: f32,
    decay_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeGenerator {
    pub fn new() -> Self {
        let mut env = Self {
            length: 0.1 * ENV_LENGTH_MAX,
            attack: 0.0,
            decay: 0.0,
            sustain: 0.8,
            release: 0.05,
            mode: EnvMode::Linear,
            stage: EnvelopeStage::Off,
            value: 0.0,
            step: 0.0,
            quick_release: false,
            attack_coeff: 0.0,
            attack_offset: 0.0,
            decay_coeff: 0.0,
            release_coeff: 0.0,
        };
        env.set_mode(EnvMode::Linear);
        env.reset();
        env
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn mode(&self) -> EnvMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Off
    }

    /// Return to Off with a zero value.
    pub fn reset(&mut self) {
        self.value = 0.0;
        self.stage = EnvelopeStage::Off;
        self.quick_release = false;
        if self.mode == EnvMode::Linear {
            self.step = self.linear_step(self.attack);
        }
    }

    pub fn set_mode(&mut self, mode: EnvMode) {
        self.mode = mode;
        self.calculate();
    }

    pub fn set_mode_normalized(&mut self, value: f32) {
        self.set_mode(EnvMode::from_normalized(value));
    }

    /// Normalized length, scaled to at most [`ENV_LENGTH_MAX`] seconds.
    pub fn set_length(&mut self, length: f32) {
        self.length = length * ENV_LENGTH_MAX;
        self.calculate();
    }

    pub fn set_attack(&mut self, attack: f32) {
        self.attack = attack;
        self.calculate();
    }

    pub fn set_decay(&mut self, decay: f32) {
        self.decay = decay;
        self.calculate();
    }

    pub fn set_sustain(&mut self, sustain: f32) {
        self.sustain = sustain;
    }

    pub fn set_release(&mut self, release: f32) {
        self.release = release;
        self.calculate();
    }

    #[inline]
    fn linear_step(&self, time: f32) -> f32 {
        1.0 / ((0.001 + 0.999 * time) * (SAMPLE_RATE * self.length))
    }

    fn coefficient(&self, time: f32, tco: f32) -> f32 {
        let mut samples = SAMPLE_RATE * time * self.length;
        if samples == 0.0 {
            samples = 1e-8;
        }
        (-((1.0 + tco) / tco).ln() / samples).exp()
    }

    fn calculate(&mut self) {
        if self.mode == EnvMode::Linear {
            return;
        }
        let (attack_tco, decay_tco, release_tco) = self.mode.tco();
        self.attack_coeff = self.coefficient(self.attack, attack_tco);
        self.attack_offset = (1.0 + attack_tco) * (1.0 - self.attack_coeff);
        self.decay_coeff = self.coefficient(self.decay, decay_tco);
        self.release_coeff = self.coefficient(self.release, release_tco);
    }

    /// Restart from zero in the attack stage.
    pub fn trigger(&mut self) {
        self.value = 0.0;
        self.step = self.linear_step(self.attack);
        self.stage = EnvelopeStage::Attack;
    }

    /// Enter release from the current value.
    pub fn stop(&mut self, quick: bool) {
        self.stage = EnvelopeStage::Release;
        if self.mode == EnvMode::Linear {
            self.step = if quick {
                1.0 / (0.002 * (SAMPLE_RATE * self.length))
            } else {
                self.linear_step(self.release)
            };
        } else if quick {
            self.quick_release = true;
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Off => self.value = 0.0,
            EnvelopeStage::Attack => self.attack_sample(),
            EnvelopeStage::Decay => self.decay_sample(),
            EnvelopeStage::Sustain => {}
            EnvelopeStage::Release => self.release_sample(),
        }
        self.value
    }

    fn attack_sample(&mut self) {
        if self.mode == EnvMode::Linear {
            self.value += self.step;
            if self.value > 1.0 {
                self.value = 1.0;
                self.step = self.linear_step(self.decay);
                self.stage = EnvelopeStage::Decay;
            }
        } else {
            self.value = self.attack_offset + self.value * self.attack_coeff;
            if self.value >= 1.0 || self.attack <= 0.0 {
                self.value = 1.0;
                self.stage = EnvelopeStage::Decay;
            }
        }
    }

    fn decay_sample(&mut self) {
        if self.mode == EnvMode::Linear {
            self.value -= self.step;
            if self.value < self.sustain {
                self.value = self.sustain;
                self.step = self.linear_step(self.release);
                self.stage = EnvelopeStage::Sustain;
            }
        } else {
            self.value *= self.decay_coeff;
            if self.value <= self.sustain || self.decay <= 0.0 {
                self.value = self.sustain;
                self.stage = EnvelopeStage::Sustain;
            }
        }
    }

    fn release_sample(&mut self) {
        if self.mode == EnvMode::Linear {
            self.value -= self.step;
            if self.value < RELEASE_FLOOR {
                self.reset();
            }
        } else {
            let coeff = if self.quick_release {
                QUICK_RELEASE_COEFF
            } else {
                self.release_coeff
            };
            self.value *= coeff;
            if self.value < RELEASE_FLOOR || self.release <= 0.0 {
                self.reset();
            }
        }
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
