use crate::dsp::math;

/// Single-coefficient low-pass smoother.
///
/// `gain` is the input weight: 1.0 passes the input untouched, 0.0 holds the
/// previous output forever. The reversed form swaps the weights so that 0.0
/// is fully open, which reads naturally for damping controls.
#[derive(Debug, Clone, Copy)]
pub struct OnePole {
    gain: f32,
    state: f32,
}

impl OnePole {
    pub fn new() -> Self {
        Self {
            gain: 0.5,
            state: 0.0,
        }
    }

    pub fn with_gain(gain: f32) -> Self {
        let mut filter = Self::new();
        filter.set_gain(gain);
        filter
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = math::clamp01(gain);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = self.gain * input + (1.0 - self.gain) * self.state;
        self.state
    }

    #[inline]
    pub fn process_reversed(&mut self, input: f32) -> f32 {
        self.state = (1.0 - self.gain) * input + self.gain * self.state;
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

impl Default for OnePole {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_gain_is_transparent() {
        let mut filter = OnePole::with_gain(1.0);
        for x in [0.3, -0.7, 1.0, 0.0] {
            assert_eq!(filter.process(x), x);
        }
    }

    #[test]
    fn smooths_toward_step_input() {
        let mut filter = OnePole::with_gain(0.1);
        let mut last = 0.0;
        for _ in 0..200 {
            let y = filter.process(1.0);
            assert!(y >= last);
            last = y;
        }
        assert!(last > 0.99, "expected convergence, got {}", last);
    }

    #[test]
    fn reversed_gain_zero_is_open() {
        let mut filter = OnePole::with_gain(0.0);
        assert_eq!(filter.process_reversed(0.5), 0.5);
    }

    #[test]
    fn gain_is_clamped() {
        assert_eq!(OnePole::with_gain(4.0).gain(), 1.0);
        assert_eq!(OnePole::with_gain(-1.0).gain(), 0.0);
    }
}
