use crate::dsp::filter::{FilterMode, SVFilter};
use crate::effects::StereoEffect;
use crate::error::{normalize_param, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum StereoFilterParam {
    Mode = 0,
    Cutoff,
    Resonance,
    SampleRate = 10,
    Tempo = 11,
}

impl StereoFilterParam {
    pub const NUM_USER_PARAMS: usize = 3;

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0 => Some(Self::Mode),
            1 => Some(Self::Cutoff),
            2 => Some(Self::Resonance),
            10 => Some(Self::SampleRate),
            11 => Some(Self::Tempo),
            _ => None,
        }
    }
}

/// A pair of identically configured state-variable filters, one per side.
#[derive(Debug, Clone)]
pub struct StereoFilter {
    filters: [SVFilter; 2],
}

impl StereoFilter {
    pub fn new() -> Self {
        Self {
            filters: [SVFilter::new(FilterMode::Off), SVFilter::new(FilterMode::Off)],
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.filters[0].mode()
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        self.filters.iter_mut().for_each(|f| f.set_mode(mode));
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.filters.iter_mut().for_each(|f| f.set_cutoff(cutoff));
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.filters
            .iter_mut()
            .for_each(|f| f.set_resonance(resonance));
    }
}

impl Default for StereoFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoEffect for StereoFilter {
    fn set_parameter(&mut self, id: u16, value: f32) -> Result<()> {
        let Some(param) = StereoFilterParam::from_id(id) else {
            return Ok(());
        };
        if matches!(
            param,
            StereoFilterParam::SampleRate | StereoFilterParam::Tempo
        ) {
            return Ok(());
        }

        let value = normalize_param(id, value)?;
        match param {
            StereoFilterParam::Mode => self.set_mode(FilterMode::from_normalized(value)),
            StereoFilterParam::Cutoff => self.set_cutoff(value),
            StereoFilterParam::Resonance => self.set_resonance(value),
            StereoFilterParam::SampleRate | StereoFilterParam::Tempo => {}
        }
        Ok(())
    }

    #[inline]
    fn process(&mut self, input: [f32; 2]) -> [f32; 2] {
        [
            self.filters[0].process(input[0]),
            self.filters[1].process(input[1]),
        ]
    }

    fn clear(&mut self) {
        self.filters.iter_mut().for_each(SVFilter::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::math::TAU;
    use crate::effects::test_util::run;

    fn tone(freq: f32, frames: usize) -> Vec<[f32; 2]> {
        (0..frames)
            .map(|i| {
                let s = (TAU * freq * i as f32 / 44_100.0).sin();
                [s, s]
            })
            .collect()
    }

    fn rms(frames: &[[f32; 2]], ch: usize) -> f32 {
        (frames.iter().map(|f| f[ch] * f[ch]).sum::<f32>() / frames.len() as f32).sqrt()
    }

    #[test]
    fn off_mode_passes_through() {
        let mut filter = StereoFilter::new();
        let input = tone(440.0, 1_000);
        let output = run(&mut filter, &input);
        for (a, b) in input.iter().zip(&output) {
            assert!((a[0] - b[0]).abs() < 1e-6);
        }
    }

    #[test]
    fn lowpass_applies_to_both_sides() {
        let mut filter = StereoFilter::new();
        filter.set_parameter(StereoFilterParam::Mode as u16, 1.0 / 6.0).unwrap();
        filter.set_parameter(StereoFilterParam::Cutoff as u16, 0.1).unwrap();
        assert_eq!(filter.mode(), FilterMode::LowPass);

        let output = run(&mut filter, &tone(8_000.0, 8_820));
        let settled = &output[4_410..];
        for ch in 0..2 {
            assert!(rms(settled, ch) < 0.05, "ch {} rms {}", ch, rms(settled, ch));
        }
    }

    #[test]
    fn highpass_keeps_high_tone() {
        let mut filter = StereoFilter::new();
        filter.set_mode(FilterMode::HighPass);
        filter.set_cutoff(0.1);
        let output = run(&mut filter, &tone(8_000.0, 8_820));
        let level = rms(&output[4_410..], 1);
        assert!(level > 0.6, "rms {}", level);
    }

    #[test]
    fn host_ids_are_ignored() {
        let mut filter = StereoFilter::new();
        assert!(filter.set_parameter(StereoFilterParam::Tempo as u16, 130.0).is_ok());
        assert!(filter.set_parameter(42, 0.3).is_ok());
    }
}
