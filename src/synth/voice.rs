//! One note of polyphony: three oscillators, three LFOs, two filters and
//! three envelopes.
//!
//! In subtractive mode the envelopes are pitch, filter and amplitude. In the
//! FM modes they become the per-operator envelopes of oscillators 1 to 3.

use crate::dsp::envelope::EnvelopeGenerator;
use crate::dsp::filter::SVFilter;
use crate::dsp::math::{self, KEYTRACK_REFERENCE_NOTE, SEMITONE_DOWN, SEMITONE_UP};
use crate::dsp::oscillator::Oscillator;
use crate::io::samples::SampleBanks;
use crate::synth::params::{FilterRouting, GlideType, ModDest, SynthParam, SynthType};
use crate::SAMPLE_RATE;

pub const NUM_OSCS: usize = 3;
pub const NUM_LFOS: usize = 3;
pub const NUM_FILTERS: usize = 2;
pub const NUM_ENVS: usize = 3;

const PITCH_ENV: usize = 0;
const FILTER_ENV: usize = 1;
const AMP_ENV: usize = 2;

/// Pitch envelope reach in semitones.
const PITCH_ENV_RANGE: i32 = 24;
/// Pitch wheel reach in semitones either way.
const PITCH_BEND_RANGE: f32 = 2.0;
pub const MAX_GLIDE_TIME_MS: f32 = 5_000.0;
pub const MAX_FM_RATIO: f32 = 20.0;

const FIXED_VELOCITY_GAIN: f32 = 0.707;

#[derive(Debug, Clone, Copy)]
struct FilterMods {
    env_mod: f32,
    vel_mod: f32,
    keytrack: f32,
}

impl Default for FilterMods {
    fn default() -> Self {
        Self {
            env_mod: 0.75,
            vel_mod: 0.75,
            keytrack: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LfoMods {
    dest: ModDest,
    amount: f32,
    keytrack: f32,
}

impl Default for LfoMods {
    fn default() -> Self {
        Self {
            dest: ModDest::None,
            amount: 0.0,
            keytrack: 0.0,
        }
    }
}

/// LFO contributions gathered once per sample.
#[derive(Debug, Default)]
struct ModSums {
    pitch: f32,
    osc_pitch: [f32; NUM_OSCS],
    amp: f32,
    osc_amp: [f32; NUM_OSCS],
    filter: [f32; NUM_FILTERS],
}

#[derive(Debug, Clone)]
pub struct Voice {
    oscs: [Oscillator; NUM_OSCS],
    osc_ratios: [f32; NUM_OSCS],
    lfos: [Oscillator; NUM_LFOS],
    lfo_mods: [LfoMods; NUM_LFOS],
    filters: [SVFilter; NUM_FILTERS],
    filter_mods: [FilterMods; NUM_FILTERS],
    envs: [EnvelopeGenerator; NUM_ENVS],

    synth_type: SynthType,
    filter_routing: FilterRouting,
    amp_env_vel_mod: f32,
    osc3_feedback: f32,
    pitch_env_mod: f32,

    note: i32,
    velocity: f32,
    frequency: f32,
    glissando_frequency: f32,
    filter_keytrack_offset: f32,
    active: bool,
    note_on: bool,

    glide_type: GlideType,
    glide_counter: f32,
    glide_increment: f32,
    glide_start: f32,
    glide_target: f32,
}

impl Voice {
    pub fn new() -> Self {
        Self {
            oscs: std::array::from_fn(|_| Oscillator::audio()),
            osc_ratios: [0.0; NUM_OSCS],
            lfos: std::array::from_fn(|_| Oscillator::lfo(0.1)),
            lfo_mods: [LfoMods::default(); NUM_LFOS],
            filters: std::array::from_fn(|_| SVFilter::default()),
            filter_mods: [FilterMods::default(); NUM_FILTERS],
            envs: std::array::from_fn(|_| EnvelopeGenerator::new()),
            synth_type: SynthType::Subtractive,
            filter_routing: FilterRouting::Serial,
            amp_env_vel_mod: 0.0,
            osc3_feedback: 0.0,
            pitch_env_mod: 0.0,
            note: -1,
            velocity: 0.0,
            frequency: 440.0,
            glissando_frequency: 440.0,
            filter_keytrack_offset: 0.0,
            active: false,
            note_on: false,
            glide_type: GlideType::Off,
            glide_counter: 0.0,
            glide_increment: 0.0,
            glide_start: 0.0,
            glide_target: 0.0,
        }
    }

    /// Sounding until the gating envelope(s) finish their release.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Between note-on and note-off.
    pub fn is_note_on(&self) -> bool {
        self.note_on
    }

    pub fn note(&self) -> i32 {
        self.note
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn synth_type(&self) -> SynthType {
        self.synth_type
    }

    /// Start or re-pitch a note.
    ///
    /// A negative `prev_note` disables glide. A negative `velocity` re-pitches
    /// without retriggering the envelopes (legato).
    pub fn note_on(&mut self, note: i32, prev_note: i32, velocity: f32) {
        self.glide_target = math::note_to_freq(note);
        let glides =
            self.glide_type != GlideType::Off && self.glide_increment > 0.0 && prev_note >= 0;

        if !self.note_on {
            if glides {
                self.glide_start = math::note_to_freq(prev_note);
                self.frequency = self.glide_start;
            } else {
                self.frequency = self.glide_target;
            }
            self.oscs.iter_mut().for_each(Oscillator::trigger);
            self.lfos.iter_mut().for_each(Oscillator::trigger);
        } else if glides {
            // Glide on from wherever the previous glide got to.
            self.glide_start = if self.glide_counter > 0.0 {
                let remaining = math::semitones_between(self.frequency, self.glide_target);
                self.frequency * glide_multiplier(self.glide_counter * remaining)
            } else {
                math::note_to_freq(prev_note)
            };
            self.frequency = self.glide_start;
        } else if self.pitch_env_mod != 0.0 {
            self.oscs.iter_mut().for_each(Oscillator::trigger);
        } else {
            self.frequency = self.glide_target;
            for osc in self.oscs.iter_mut() {
                osc.set_pitch(self.frequency);
            }
        }

        self.glide_counter = 0.0;
        self.filter_keytrack_offset =
            self.frequency - math::note_to_freq(KEYTRACK_REFERENCE_NOTE);
        self.note = note;

        let key_offset = (note - KEYTRACK_REFERENCE_NOTE) as f32 / 64.0;
        for (lfo, mods) in self.lfos.iter_mut().zip(self.lfo_mods.iter()) {
            lfo.set_pitch_mod(mods.keytrack * key_offset);
        }

        self.active = true;
        self.note_on = true;
        if velocity > 0.0 {
            self.velocity = velocity;
            self.envs.iter_mut().for_each(EnvelopeGenerator::trigger);
        }
    }

    /// Release every envelope, optionally with the fast release used when
    /// stealing.
    pub fn note_off(&mut self, quick: bool) {
        for env in self.envs.iter_mut() {
            env.stop(quick);
        }
        self.note_on = false;
    }

    fn set_pitch_bend(&mut self, value: f32) {
        let bend = (math::clamp01(value) - 0.5) * 2.0;
        let ratio = ((bend * PITCH_BEND_RANGE) / 12.0).exp2();
        for osc in self.oscs.iter_mut() {
            osc.set_pitch_bend(ratio);
        }
    }

    fn set_pitch_env_mod(&mut self, value: f32) {
        self.pitch_env_mod = if value >= 0.5 {
            (value - 0.5) * 2.0
        } else {
            (0.5 - value) * -2.0
        };
    }

    /// Frequency offset the pitch envelope sweeps through at full level.
    fn pitch_env_multiplier(&self) -> f32 {
        let base = math::note_to_freq(self.note);
        if self.pitch_env_mod > 0.0 {
            self.pitch_env_mod * (base * SEMITONE_UP.powi(PITCH_ENV_RANGE))
        } else if self.pitch_env_mod < 0.0 {
            self.pitch_env_mod * (base * SEMITONE_DOWN.powi(PITCH_ENV_RANGE) + base)
        } else {
            0.0
        }
    }

    fn set_glide_time(&mut self, ms: f32) {
        self.glide_increment = if ms == 0.0 {
            1.0
        } else {
            1_000.0 / ms / SAMPLE_RATE
        };
    }

    /// Apply an already normalized parameter. Ids the voice does not own are
    /// ignored.
    pub fn set_parameter(&mut self, param: SynthParam, value: f32) {
        use SynthParam as P;

        let slot = param.slot();
        match param {
            P::PitchBend => self.set_pitch_bend(value),
            P::FilterRouting => self.filter_routing = FilterRouting::from_normalized(value),

            P::Osc1Waveform | P::Osc2Waveform | P::Osc3Waveform => {
                self.oscs[slot].set_waveform(value)
            }
            P::Osc1Detune | P::Osc2Detune | P::Osc3Detune => self.oscs[slot].set_detune(value),
            P::Osc1Semi | P::Osc2Semi | P::Osc3Semi => self.oscs[slot].set_semi(value),
            P::Osc1Volume | P::Osc2Volume | P::Osc3Volume => self.oscs[slot].set_volume(value),
            P::Osc1PulseWidth | P::Osc2PulseWidth | P::Osc3PulseWidth => {
                self.oscs[slot].set_pulse_width(value)
            }
            P::Osc1Pwm | P::Osc2Pwm | P::Osc3Pwm => self.oscs[slot].set_pwm(value),
            P::Osc1Ratio | P::Osc2Ratio | P::Osc3Ratio => {
                self.osc_ratios[slot] = value * MAX_FM_RATIO;
                self.oscs[slot].set_sample_slot(self.osc_ratios[slot] as u8);
            }
            P::Osc3Feedback => self.osc3_feedback = value,

            P::Lfo1Waveform | P::Lfo2Waveform | P::Lfo3Waveform => {
                self.lfos[slot].set_waveform(value)
            }
            P::Lfo1Speed | P::Lfo2Speed | P::Lfo3Speed => self.lfos[slot].set_pitch(value),
            P::Lfo1StartPhase | P::Lfo2StartPhase | P::Lfo3StartPhase => {
                self.lfos[slot].set_start_phase(value)
            }
            P::Lfo1KeyTrack | P::Lfo2KeyTrack | P::Lfo3KeyTrack => {
                self.lfo_mods[slot].keytrack = (value - 0.5) * 2.0
            }
            P::Lfo1ModDest | P::Lfo2ModDest | P::Lfo3ModDest => {
                self.lfo_mods[slot].dest = ModDest::from_normalized(value)
            }
            P::Lfo1ModAmount | P::Lfo2ModAmount | P::Lfo3ModAmount => {
                self.lfo_mods[slot].amount = value
            }

            P::EnvMode => {
                for env in self.envs.iter_mut() {
                    env.set_mode_normalized(value);
                }
            }
            P::EnvLength => {
                for env in self.envs.iter_mut() {
                    env.set_length(value);
                }
            }
            P::PitchEnvMod => self.set_pitch_env_mod(value),
            P::PitchAttack => self.envs[PITCH_ENV].set_attack(value),
            P::PitchDecay => self.envs[PITCH_ENV].set_decay(value),
            P::PitchSustain => self.envs[PITCH_ENV].set_sustain(value),
            P::PitchRelease => self.envs[PITCH_ENV].set_release(value),
            P::FilterAttack => self.envs[FILTER_ENV].set_attack(value),
            P::FilterDecay => self.envs[FILTER_ENV].set_decay(value),
            P::FilterSustain => self.envs[FILTER_ENV].set_sustain(value),
            P::FilterRelease => self.envs[FILTER_ENV].set_release(value),
            P::AmpAttack => self.envs[AMP_ENV].set_attack(value),
            P::AmpDecay => self.envs[AMP_ENV].set_decay(value),
            P::AmpSustain => self.envs[AMP_ENV].set_sustain(value),
            P::AmpRelease => self.envs[AMP_ENV].set_release(value),
            P::AmpEnvVelMod => self.amp_env_vel_mod = value,

            P::Filter1Mode | P::Filter2Mode => self.filters[slot].set_mode_normalized(value),
            P::Filter1Cutoff | P::Filter2Cutoff => self.filters[slot].set_cutoff(value),
            P::Filter1Resonance | P::Filter2Resonance => self.filters[slot].set_resonance(value),
            P::Filter1Drive | P::Filter2Drive => self.filters[slot].set_drive(value),
            P::Filter1OutputLevel | P::Filter2OutputLevel => {
                self.filters[slot].set_output_level(value)
            }
            P::Filter1KeyTrack | P::Filter2KeyTrack => {
                self.filter_mods[slot].keytrack = (value - 0.5) * 2.0
            }
            P::Filter1EnvMod | P::Filter2EnvMod => {
                let amount = (value - 0.5) * 2.0;
                self.filter_mods[slot].env_mod = amount * amount;
            }
            P::Filter1VelMod | P::Filter2VelMod => {
                let amount = (value - 0.5) * 2.0;
                self.filter_mods[slot].vel_mod = amount * amount;
            }

            P::GlideType => self.glide_type = GlideType::from_normalized(value),
            P::GlideTime => self.set_glide_time(value * MAX_GLIDE_TIME_MS),
            P::SynthType => self.synth_type = SynthType::from_normalized(value),

            P::PolyMode | P::Pan | P::Tempo | P::SampleRate | P::FmAlgorithm => {}
        }
    }

    fn gather_lfo_mods(&mut self, banks: &SampleBanks) -> ModSums {
        let mut sums = ModSums::default();

        for (lfo, mods) in self.lfos.iter_mut().zip(self.lfo_mods.iter()) {
            let value = mods.amount * lfo.next_sample(banks);
            match mods.dest {
                ModDest::None => {}
                ModDest::Pitch => sums.pitch += value,
                ModDest::PitchOsc1 => sums.osc_pitch[0] += value,
                ModDest::PitchOsc2 => sums.osc_pitch[1] += value,
                ModDest::PitchOsc3 => sums.osc_pitch[2] += value,
                ModDest::Amp => sums.amp += value,
                ModDest::AmpOsc1 => sums.osc_amp[0] += value,
                ModDest::AmpOsc2 => sums.osc_amp[1] += value,
                ModDest::AmpOsc3 => sums.osc_amp[2] += value,
                ModDest::Filter1Cutoff => sums.filter[0] += value,
                ModDest::Filter2Cutoff => sums.filter[1] += value,
                ModDest::Pwm => {
                    for osc in self.oscs.iter_mut() {
                        osc.set_pulse_width_mod(value);
                    }
                }
            }
        }

        sums.pitch = math::clamp1(sums.pitch);
        for mod_value in sums.osc_pitch.iter_mut() {
            *mod_value = math::clamp1(*mod_value);
        }
        sums
    }

    fn advance_glide(&mut self) {
        if self.glide_type == GlideType::Off {
            return;
        }

        if self.glide_increment > 0.0 && self.frequency != self.glide_target {
            if self.glide_counter >= 1.0 {
                self.frequency = self.glide_target;
                if self.glide_type == GlideType::Glissando {
                    self.glissando_frequency = self.frequency;
                }
                self.glide_counter = 0.0;
            } else {
                let span = math::semitones_between(self.glide_start, self.glide_target);
                self.frequency = self.glide_start * glide_multiplier(self.glide_counter * span);
                self.glide_counter += self.glide_increment;
                if self.glide_type == GlideType::Glissando {
                    self.glissando_frequency =
                        math::note_to_freq(math::closest_note(self.frequency));
                }
            }
        }

        let pitch = if self.glide_type == GlideType::Glissando {
            self.glissando_frequency
        } else {
            self.frequency
        };
        for osc in self.oscs.iter_mut() {
            osc.set_pitch(pitch);
        }
    }

    fn filter_block(&mut self, input: f32) -> f32 {
        match self.filter_routing {
            FilterRouting::Serial => self
                .filters
                .iter_mut()
                .fold(input, |acc, filter| filter.process(acc)),
            FilterRouting::Parallel => {
                let a = self.filters[0].process(input);
                0.5 * (a + self.filters[1].process(input))
            }
        }
    }

    pub fn next_sample(&mut self, banks: &SampleBanks) -> f32 {
        let mods = self.gather_lfo_mods(banks);
        self.advance_glide();

        let keytrack = self.filter_keytrack_offset / (0.5 * SAMPLE_RATE);

        match self.synth_type {
            SynthType::Subtractive => self.subtractive_sample(&mods, keytrack, banks),
            fm => self.fm_sample(fm, &mods, keytrack, banks),
        }
    }

    fn subtractive_sample(&mut self, mods: &ModSums, keytrack: f32, banks: &SampleBanks) -> f32 {
        let mut pitch_mult = 1.0;
        if self.pitch_env_mod != 0.0 {
            pitch_mult += self.pitch_env_multiplier() * self.envs[PITCH_ENV].next_sample();
        }

        let mut out = 0.0;
        for (i, osc) in self.oscs.iter_mut().enumerate() {
            osc.set_pitch_mod(mods.pitch + mods.osc_pitch[i]);
            osc.set_pitch(self.frequency * pitch_mult);
            out += (1.0 + mods.osc_amp[i]) * osc.next_sample(banks);
        }

        let filter_env = self.envs[FILTER_ENV].next_sample();
        for (i, filter) in self.filters.iter_mut().enumerate() {
            let fm = &self.filter_mods[i];
            filter.set_mod(fm.env_mod + 2.0 * fm.vel_mod * self.velocity, filter_env);
            filter.set_static_mod(keytrack * 2.0 * fm.keytrack + mods.filter[i]);
        }
        out = self.filter_block(out);

        if !self.envs[AMP_ENV].is_active() {
            self.active = false;
            self.oscs.iter_mut().for_each(Oscillator::stop);
        }

        out *= self.envs[AMP_ENV].next_sample() * (1.0 + mods.amp);
        self.amp_env_vel_mod * self.velocity * out
            + (1.0 - self.amp_env_vel_mod) * out * FIXED_VELOCITY_GAIN
    }

    #[inline]
    fn operator(&mut self, index: usize, banks: &SampleBanks) -> f32 {
        self.envs[index].next_sample() * self.oscs[index].next_sample(banks)
    }

    #[inline]
    fn tune_operator(&mut self, index: usize) {
        let pitch = self.frequency * self.osc_ratios[index];
        self.oscs[index].set_pitch(pitch);
    }

    /// Operator 3 output with its self-feedback applied for the next sample.
    fn feedback_operator(&mut self, banks: &SampleBanks) -> f32 {
        let out = self.operator(2, banks);
        self.oscs[2].set_phase_mod(self.osc3_feedback * out);
        self.tune_operator(2);
        out
    }

    fn fm_sample(
        &mut self,
        algorithm: SynthType,
        mods: &ModSums,
        keytrack: f32,
        banks: &SampleBanks,
    ) -> f32 {
        // The operators free-run once here before the algorithm reads them.
        for (i, osc) in self.oscs.iter_mut().enumerate() {
            osc.set_pitch_mod(mods.pitch + mods.osc_pitch[i]);
            osc.next_sample(banks);
        }

        let out = match algorithm {
            // 3 → 2 → 1
            SynthType::FmAlgo1 => {
                let m = self.feedback_operator(banks);
                self.oscs[1].set_phase_mod(m);
                self.tune_operator(1);
                let m = self.operator(1, banks);
                self.oscs[0].set_phase_mod(m);
                self.tune_operator(0);
                self.operator(0, banks)
            }
            // (3 + 2) → 1
            SynthType::FmAlgo2 => {
                let mut m = self.feedback_operator(banks);
                self.tune_operator(1);
                m += self.operator(1, banks);
                self.oscs[0].set_phase_mod(m);
                self.tune_operator(0);
                self.operator(0, banks)
            }
            // 2 → 1, plus 3
            SynthType::FmAlgo3 => {
                self.tune_operator(1);
                let m = self.operator(1, banks);
                self.oscs[0].set_phase_mod(m);
                self.tune_operator(0);
                let carrier = self.operator(0, banks);
                carrier + self.feedback_operator(banks)
            }
            // 3 → 2, plus 1
            SynthType::FmAlgo4 => {
                let m = self.feedback_operator(banks);
                self.oscs[1].set_phase_mod(m);
                self.tune_operator(1);
                let mut out = self.operator(1, banks);
                self.tune_operator(0);
                out += self.operator(0, banks);
                out
            }
            // 3 → (2 + 1), operator 3 also audible
            SynthType::FmAlgo5 => {
                let mut out = self.feedback_operator(banks);
                self.oscs[1].set_phase_mod(out);
                self.oscs[0].set_phase_mod(out);
                self.tune_operator(1);
                out += self.operator(1, banks);
                self.tune_operator(0);
                out += self.operator(0, banks);
                out
            }
            // 3 + 2 + 1
            SynthType::FmAlgo6 | SynthType::Subtractive => {
                let mut out = self.feedback_operator(banks);
                self.tune_operator(1);
                out += self.operator(1, banks);
                self.tune_operator(0);
                out += self.operator(0, banks);
                out
            }
        };

        self.active = self.envs.iter().any(EnvelopeGenerator::is_active);
        if !self.active {
            self.oscs.iter_mut().for_each(Oscillator::stop);
        }

        for (i, filter) in self.filters.iter_mut().enumerate() {
            let fm = &self.filter_mods[i];
            filter.set_static_mod(fm.vel_mod * self.velocity + keytrack * 2.0 * fm.keytrack + mods.filter[i]);
        }
        self.filter_block(out) * self.velocity
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn glide_multiplier(semitones: f32) -> f32 {
    if semitones == 0.0 {
        1.0
    } else {
        (semitones / 12.0).exp2()
    }
}
