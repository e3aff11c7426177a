//! Stereo effect processors.
//!
//! Every effect takes one stereo frame and returns one, and is controlled the
//! same way as an instrument: a numeric parameter id and a normalized value.

use crate::error::Result;

pub mod chorus;
pub mod distortion;
pub mod echo;
pub mod reverb;
pub mod stereo_filter;

pub use chorus::{Chorus, ChorusParam};
pub use distortion::{Distortion, DistortionMode, DistortionParam, OversamplingMode};
pub use echo::{Echo, EchoMode, EchoParam};
pub use reverb::{Reverb, ReverbParam};
pub use stereo_filter::{StereoFilter, StereoFilterParam};

pub trait StereoEffect {
    /// Set parameter `id`. Unknown ids are ignored.
    fn set_parameter(&mut self, id: u16, value: f32) -> Result<()>;

    fn process(&mut self, input: [f32; 2]) -> [f32; 2];

    /// Drop any buffered signal.
    fn clear(&mut self) {}

    /// Load parameters from their 16-bit stored form, id = position.
    fn init(&mut self, params: &[u16]) -> Result<()> {
        for (id, &raw) in params.iter().enumerate() {
            self.set_parameter(id as u16, raw as f32 / 65_535.0)?;
        }
        Ok(())
    }

    /// Process an interleaved stereo buffer in place.
    fn render(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            let [left, right] = self.process([frame[0], frame[1]]);
            frame[0] = left;
            frame[1] = right;
        }
    }
}

/// Dry/wet crossfade shared by the delay-based effects.
#[inline]
pub(crate) fn blend(dry: f32, wet: f32, mix: f32) -> f32 {
    (1.0 - mix) * dry + mix * wet
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::StereoEffect;

    /// Deterministic stereo test signal: a decaying chirp, different per side.
    pub fn signal(frames: usize) -> Vec<[f32; 2]> {
        (0..frames)
            .map(|i| {
                let t = i as f32 / 44_100.0;
                let env = (-3.0 * t).exp();
                [
                    env * (2_000.0 * t * (1.0 + t)).sin(),
                    env * (1_300.0 * t * (1.0 + 0.5 * t)).cos(),
                ]
            })
            .collect()
    }

    pub fn run<E: StereoEffect>(effect: &mut E, input: &[[f32; 2]]) -> Vec<[f32; 2]> {
        input.iter().map(|&frame| effect.process(frame)).collect()
    }

    pub fn assert_passthrough(input: &[[f32; 2]], output: &[[f32; 2]]) {
        for (i, (a, b)) in input.iter().zip(output).enumerate() {
            for ch in 0..2 {
                assert!(
                    (a[ch] - b[ch]).abs() < 1e-6,
                    "frame {} ch {}: {} != {}",
                    i,
                    ch,
                    a[ch],
                    b[ch]
                );
            }
        }
    }

    /// Unit impulse on both channels at frame 0.
    pub fn impulse(frames: usize) -> Vec<[f32; 2]> {
        let mut buffer = vec![[0.0; 2]; frames];
        if let Some(first) = buffer.first_mut() {
            *first = [1.0, 1.0];
        }
        buffer
    }
}
