use crate::dsp::math;

/// Backing store for every delay line: two seconds at 44.1 kHz.
pub const MAX_DELAY_SAMPLES: usize = 88_200;

/// Circular delay line with a configurable length inside a fixed buffer.
///
/// Reads and writes wrap at the configured length, never at the backing
/// buffer size, so shortening the line shortens the echo.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    length: usize,
    feedback: f32,
}

impl DelayLine {
    pub fn new() -> Self {
        Self {
            buffer: vec![0.0; MAX_DELAY_SAMPLES],
            write_pos: 0,
            length: 1,
            feedback: 0.0,
        }
    }

    pub fn with_length(length: usize) -> Self {
        let mut line = Self::new();
        line.set_length(length);
        line
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    /// Delay length as a fraction of the full buffer.
    pub fn set_time(&mut self, time: f32) {
        self.set_length((MAX_DELAY_SAMPLES as f32 * time) as usize);
    }

    /// Set the delay length in samples (at least one) and clear the buffer.
    pub fn set_length(&mut self, length: usize) {
        self.length = length.clamp(1, MAX_DELAY_SAMPLES);
        if self.write_pos >= self.length {
            self.write_pos = 0;
        }
        self.clear();
    }

    #[inline]
    pub fn sample_at(&self, index: usize) -> f32 {
        self.buffer[index % self.length]
    }

    /// Sample written `delay` writes ago, counting the most recent as 1.
    #[inline]
    pub fn delayed_by(&self, delay: i32) -> f32 {
        let index = (self.write_pos as i32 - delay).rem_euclid(self.length as i32);
        self.buffer[index as usize]
    }

    /// Linearly interpolated read between the two neighbouring taps.
    #[inline]
    pub fn delayed_by_frac(&self, delay: f32) -> f32 {
        let whole = delay as i32;
        let frac = delay % 1.0;
        let a = self.delayed_by(whole);
        let b = self.delayed_by(whole + 1);
        (1.0 - frac) * a + frac * b
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos >= self.length {
            self.write_pos = 0;
        }
    }

    /// Oldest sample in the line, about to be overwritten.
    #[inline]
    pub fn read(&self) -> f32 {
        self.buffer[self.write_pos]
    }

    /// Read the oldest sample and write `input` plus feedback in its place.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let out = self.read();
        let mut input = input + out * self.feedback;
        math::add_dc(&mut input);
        self.write(input);
        out
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }

    pub fn reset(&mut self) {
        self.clear();
        self.write_pos = 0;
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}

/// Schroeder allpass built on a [`DelayLine`].
///
/// With `invert` set the feedforward and feedback signs swap, as used by the
/// modulated allpasses in the reverb tank.
#[derive(Debug, Clone)]
pub struct AllPass {
    line: DelayLine,
    feedback: f32,
    invert: bool,
}

impl AllPass {
    pub fn new() -> Self {
        Self {
            line: DelayLine::new(),
            feedback: 0.0,
            invert: false,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = math::clamp01(feedback);
    }

    pub fn set_length(&mut self, length: usize) {
        self.line.set_length(length);
    }

    pub fn set_invert(&mut self, invert: bool) {
        self.invert = invert;
    }

    #[inline]
    pub fn delayed_by(&self, delay: i32) -> f32 {
        self.line.delayed_by(delay)
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let sign = if self.invert { 1.0 } else { -1.0 };
        let delayed = self.line.read();
        let mut input = input + sign * delayed * self.feedback;
        math::add_dc(&mut input);
        self.line.write(input);
        delayed - sign * input * self.feedback
    }

    pub fn clear(&mut self) {
        self.line.clear();
    }
}

impl Default for AllPass {
    fn default() -> Self {
        Self::new()
    }
}
