use crate::dsp::delay::{DelayLine, MAX_DELAY_SAMPLES};
use crate::dsp::math;
use crate::dsp::oscillator::Oscillator;
use crate::effects::{blend, StereoEffect};
use crate::error::{normalize_param, Result};
use crate::io::samples::NO_SAMPLES;
use crate::SAMPLE_RATE;

/*
Chorus
======

Thickens a sound by mixing it with a copy whose delay time is swept by a
slow sine LFO. The moving delay detunes the copy slightly, like a second
player doubling the part.

   in ──┬───────────────────────────────────────→ ×(1−mix) ──┐
        │                                                    (+)──→ out
        └──→ (+) ──→ [delay, swept by LFO] ──┬──→ ×mix ──────┘
              ↑                              │
              └──────────── ×feedback ───────┘

The sweep window is [delay, delay + depth] × 40 ms. The read point sits at
the window centre and swings by ±depth × centre:

    offset = sample_rate · centre · (1 + lfo · depth)

Fractional offsets are linearly interpolated.
*/

/// Full-scale sweep window in seconds.
pub const CHORUS_RANGE_SECONDS: f32 = 0.040;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ChorusParam {
    Mix = 0,
    Delay,
    Depth,
    Rate,
    Feedback,
    SampleRate = 12,
}

impl ChorusParam {
    pub const NUM_USER_PARAMS: usize = 5;

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0 => Some(Self::Mix),
            1 => Some(Self::Delay),
            2 => Some(Self::Depth),
            3 => Some(Self::Rate),
            4 => Some(Self::Feedback),
            12 => Some(Self::SampleRate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chorus {
    lfo: Oscillator,
    lines: [DelayLine; 2],
    mix: f32,
    delay: f32,
    depth: f32,
    feedback: f32,
    min_delay: f32,
    max_delay: f32,
}

impl Chorus {
    pub fn new() -> Self {
        let mut chorus = Self {
            lfo: Oscillator::lfo(0.01),
            lines: [
                DelayLine::with_length(MAX_DELAY_SAMPLES),
                DelayLine::with_length(MAX_DELAY_SAMPLES),
            ],
            mix: 0.5,
            delay: 0.0,
            depth: 1.0,
            feedback: 0.0,
            min_delay: 0.0,
            max_delay: 0.0,
        };
        chorus.update_range();
        chorus
    }

    fn update_range(&mut self) {
        self.min_delay = self.delay * CHORUS_RANGE_SECONDS;
        self.max_delay = self.min_delay + self.depth * CHORUS_RANGE_SECONDS;
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix;
    }

    pub fn set_delay(&mut self, delay: f32) {
        self.delay = delay;
        self.update_range();
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth;
        self.update_range();
    }

    /// Normalized LFO speed.
    pub fn set_rate(&mut self, rate: f32) {
        self.lfo.set_pitch(rate);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }
}

impl Default for Chorus {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoEffect for Chorus {
    fn set_parameter(&mut self, id: u16, value: f32) -> Result<()> {
        let Some(param) = ChorusParam::from_id(id) else {
            return Ok(());
        };
        if param == ChorusParam::SampleRate {
            return Ok(());
        }

        let value = normalize_param(id, value)?;
        match param {
            ChorusParam::Mix => self.set_mix(value),
            ChorusParam::Delay => self.set_delay(value),
            ChorusParam::Depth => self.set_depth(value),
            ChorusParam::Rate => self.set_rate(value),
            ChorusParam::Feedback => self.set_feedback(value),
            ChorusParam::SampleRate => {}
        }
        Ok(())
    }

    fn process(&mut self, input: [f32; 2]) -> [f32; 2] {
        let centre = (self.max_delay + self.min_delay) * 0.5;
        let sweep = self.lfo.next_sample(&NO_SAMPLES);
        let offset = SAMPLE_RATE * (centre + sweep * self.depth * centre);

        let mut out = [0.0; 2];
        for (ch, line) in self.lines.iter_mut().enumerate() {
            let wet = line.delayed_by_frac(offset);
            let mut feed = input[ch] + self.feedback * wet;
            math::add_dc(&mut feed);
            line.write(feed);
            out[ch] = blend(input[ch], wet, self.mix);
        }
        out
    }

    fn clear(&mut self) {
        self.lines.iter_mut().for_each(DelayLine::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_util::{assert_passthrough, impulse, run, signal};

    #[test]
    fn dry_mix_passes_input() {
        let mut chorus = Chorus::new();
        chorus.set_parameter(ChorusParam::Mix as u16, 0.0).unwrap();
        chorus.set_parameter(ChorusParam::Feedback as u16, 0.7).unwrap();
        let input = signal(4_000);
        let output = run(&mut chorus, &input);
        assert_passthrough(&input, &output);
    }

    #[test]
    fn wet_mix_has_no_direct_path() {
        let mut chorus = Chorus::new();
        chorus.set_parameter(ChorusParam::Mix as u16, 1.0).unwrap();
        chorus.set_parameter(ChorusParam::Delay as u16, 0.25).unwrap();
        let output = run(&mut chorus, &impulse(2_000));
        assert!(output[0].iter().all(|s| s.abs() < 1e-6), "{:?}", output[0]);

        let energy: f32 = output.iter().map(|f| f[0] * f[0] + f[1] * f[1]).sum();
        assert!(energy > 0.1, "impulse never came back: {}", energy);
    }

    #[test]
    fn echo_arrives_inside_sweep_window() {
        let mut chorus = Chorus::new();
        chorus.set_parameter(ChorusParam::Mix as u16, 1.0).unwrap();
        chorus.set_parameter(ChorusParam::Delay as u16, 0.5).unwrap(); // 20 ms
        chorus.set_parameter(ChorusParam::Depth as u16, 0.25).unwrap(); // +10 ms
        let output = run(&mut chorus, &impulse(4_000));

        let arrival = output
            .iter()
            .position(|f| f[0].abs() > 0.05)
            .expect("no echo");
        // Centre 25 ms swung by at most a quarter: 18.75..31.25 ms.
        assert!((820..=1_380).contains(&arrival), "arrival {}", arrival);
    }

    #[test]
    fn unknown_and_host_ids_are_ignored() {
        let mut chorus = Chorus::new();
        assert!(chorus.set_parameter(ChorusParam::SampleRate as u16, 44_100.0).is_ok());
        assert!(chorus.set_parameter(99, 0.5).is_ok());
    }
}
