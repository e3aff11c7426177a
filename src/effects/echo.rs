use crate::dsp::delay::DelayLine;
use crate::dsp::math;
use crate::dsp::one_pole::OnePole;
use crate::effects::{blend, StereoEffect};
use crate::error::{normalize_param, Result};

/// Routing between the two delay lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EchoMode {
    #[default]
    Off,
    /// Both lines fed with the mono sum.
    Mono,
    /// Independent left and right lines.
    Stereo,
    /// Mono sum into the left line, bouncing between the sides.
    PingPong,
    /// Each side feeds the opposite line.
    Cross,
}

impl EchoMode {
    pub const ALL: [EchoMode; 5] = [
        EchoMode::Off,
        EchoMode::Mono,
        EchoMode::Stereo,
        EchoMode::PingPong,
        EchoMode::Cross,
    ];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum EchoParam {
    Mode = 0,
    Mix,
    Time,
    Feedback,
    LowPass,
    HighPass,
    SampleRate = 13,
    Tempo = 14,
}

impl EchoParam {
    pub const NUM_USER_PARAMS: usize = 6;

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0 => Some(Self::Mode),
            1 => Some(Self::Mix),
            2 => Some(Self::Time),
            3 => Some(Self::Feedback),
            4 => Some(Self::LowPass),
            5 => Some(Self::HighPass),
            13 => Some(Self::SampleRate),
            14 => Some(Self::Tempo),
            _ => None,
        }
    }
}

/// Stereo delay with filtered feedback in the cross-fed modes.
#[derive(Debug, Clone)]
pub struct Echo {
    mode: EchoMode,
    mix: f32,
    feedback: f32,
    lines: [DelayLine; 2],
    lowpass: [OnePole; 2],
    highpass: [OnePole; 2],
    outputs: [f32; 2],
}

impl Echo {
    pub fn new() -> Self {
        Self {
            mode: EchoMode::Off,
            mix: 0.5,
            feedback: 0.0,
            lines: [DelayLine::new(), DelayLine::new()],
            lowpass: [OnePole::with_gain(1.0); 2],
            highpass: [OnePole::with_gain(0.0); 2],
            outputs: [0.0; 2],
        }
    }

    pub fn mode(&self) -> EchoMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EchoMode) {
        self.mode = mode;
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix;
    }

    /// Delay time as a fraction of the two second buffer.
    pub fn set_time(&mut self, time: f32) {
        self.lines.iter_mut().for_each(|line| line.set_time(time));
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
        self.lines
            .iter_mut()
            .for_each(|line| line.set_feedback(feedback));
    }

    pub fn set_lowpass(&mut self, gain: f32) {
        self.lowpass.iter_mut().for_each(|f| f.set_gain(gain));
    }

    pub fn set_highpass(&mut self, gain: f32) {
        self.highpass.iter_mut().for_each(|f| f.set_gain(gain));
    }

    fn cross_feed(&mut self, mut temp: [f32; 2]) {
        for ii in 0..2 {
            self.outputs[ii] = self.lines[1 - ii].read();
            temp[ii] += self.feedback * self.outputs[ii];
            temp[ii] = self.lowpass[ii].process(temp[ii]);
            temp[ii] -= self.highpass[ii].process(temp[ii]);
            math::add_dc(&mut temp[ii]);
            self.lines[ii].write(temp[ii]);
        }
    }
}

impl Default for Echo {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoEffect for Echo {
    fn set_parameter(&mut self, id: u16, value: f32) -> Result<()> {
        let Some(param) = EchoParam::from_id(id) else {
            return Ok(());
        };
        if matches!(param, EchoParam::SampleRate | EchoParam::Tempo) {
            return Ok(());
        }

        let value = normalize_param(id, value)?;
        match param {
            EchoParam::Mode => self.set_mode(EchoMode::from_normalized(value)),
            EchoParam::Mix => self.set_mix(value),
            EchoParam::Time => self.set_time(value),
            EchoParam::Feedback => self.set_feedback(value),
            EchoParam::LowPass => self.set_lowpass(value),
            EchoParam::HighPass => self.set_highpass(value),
            EchoParam::SampleRate | EchoParam::Tempo => {}
        }
        Ok(())
    }

    fn process(&mut self, input: [f32; 2]) -> [f32; 2] {
        match self.mode {
            EchoMode::Mono => {
                let sum = 0.5 * (input[0] + input[1]);
                self.outputs = [self.lines[0].process(sum), self.lines[1].process(sum)];
            }
            EchoMode::Stereo => {
                self.outputs = [
                    self.lines[0].process(input[0]),
                    self.lines[1].process(input[1]),
                ];
            }
            EchoMode::PingPong => self.cross_feed([0.5 * (input[0] + input[1]), 0.0]),
            EchoMode::Cross => self.cross_feed(input),
            EchoMode::Off => {
                // Lines keep draining; the last wet frame is held.
                self.lines[0].process(0.0);
                self.lines[1].process(0.0);
            }
        }

        [
            blend(input[0], self.outputs[0], self.mix),
            blend(input[1], self.outputs[1], self.mix),
        ]
    }

    fn clear(&mut self) {
        self.lines.iter_mut().for_each(DelayLine::clear);
        self.outputs = [0.0; 2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_util::{assert_passthrough, impulse, run, signal};

    fn echo(mode: EchoMode, mix: f32, time: f32, feedback: f32) -> Echo {
        let mut echo = Echo::new();
        echo.set_mode(mode);
        echo.set_parameter(EchoParam::Mix as u16, mix).unwrap();
        echo.set_parameter(EchoParam::Time as u16, time).unwrap();
        echo.set_parameter(EchoParam::Feedback as u16, feedback).unwrap();
        echo
    }

    #[test]
    fn mode_selector_rounds() {
        assert_eq!(EchoMode::from_normalized(0.0), EchoMode::Off);
        assert_eq!(EchoMode::from_normalized(0.25), EchoMode::Mono);
        assert_eq!(EchoMode::from_normalized(0.5), EchoMode::Stereo);
        assert_eq!(EchoMode::from_normalized(0.74), EchoMode::PingPong);
        assert_eq!(EchoMode::from_normalized(1.0), EchoMode::Cross);
    }

    #[test]
    fn dry_mix_passes_input() {
        for mode in EchoMode::ALL {
            let mut echo = echo(mode, 0.0, 0.01, 0.5);
            let input = signal(2_000);
            let output = run(&mut echo, &input);
            assert_passthrough(&input, &output);
        }
    }

    #[test]
    fn stereo_repeats_after_delay_time() {
        // 0.01 of the buffer is 882 samples.
        let mut echo = echo(EchoMode::Stereo, 1.0, 0.01, 0.5);
        let output = run(&mut echo, &impulse(3_000));

        assert!(output[0][0].abs() < 1e-6, "direct path leaked: {}", output[0][0]);
        assert!((output[882][0] - 1.0).abs() < 1e-3, "first repeat {}", output[882][0]);
        assert!((output[1764][0] - 0.5).abs() < 1e-3, "second repeat {}", output[1764][0]);
    }

    #[test]
    fn ping_pong_alternates_sides() {
        let mut echo = echo(EchoMode::PingPong, 1.0, 0.01, 0.8);
        let output = run(&mut echo, &impulse(3_000));

        // The mono sum enters the left line and is heard on the right first.
        let first_right = output.iter().position(|f| f[1].abs() > 0.1).expect("no right echo");
        let first_left = output.iter().position(|f| f[0].abs() > 0.1).expect("no left echo");
        assert!(first_right < first_left, "right {} left {}", first_right, first_left);
    }

    #[test]
    fn off_mode_emits_no_echo() {
        let mut echo = echo(EchoMode::Off, 1.0, 0.01, 0.9);
        let output = run(&mut echo, &impulse(2_000));
        assert!(output.iter().all(|f| f[0] == 0.0 && f[1] == 0.0));
    }

    #[test]
    fn host_ids_are_ignored() {
        let mut echo = Echo::new();
        assert!(echo.set_parameter(EchoParam::Tempo as u16, 140.0).is_ok());
        assert!(echo.set_parameter(EchoParam::SampleRate as u16, 44_100.0).is_ok());
    }
}
