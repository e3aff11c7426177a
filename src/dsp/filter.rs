#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::math::{self, ONE_OVER_SQRT2, PI};
use crate::SAMPLE_RATE;

/*
Zero-Delay-Feedback State Variable Filter
=========================================

Two trapezoidal integrators in a loop, solved algebraically each sample so
there is no unit delay inside the feedback path. One pass yields three
outputs at once; each mode is a linear mix of them.

              ┌─────────────────────────── R2·s1 + g·s1 + s2 ──┐
              ↓                                                 │
   in ──→ (−) ──→ ×h ──→ yH ──→ [∫ g] ──→ yB ──→ [∫ g] ──→ yL ──┘

  g   integrator gain        tan(π·fc/fs)
  R2  twice the damping      1/Q for the resonant modes
  h   feedback solution      1 / (1 + R2·g + g²)

| mode            | cL | cB  | cH | damping                          |
| --------------- | -- | --- | -- | -------------------------------- |
| off             | –  | –   | –  | bypassed                         |
| lowpass         | 1  | 0   | 0  | 1/Q                              |
| highpass        | 0  | 0   | 1  | 1/Q                              |
| bandpass skirt  | 0  | 1   | 0  | 1/(1 + bandwidth)                |
| bandpass peak   | 0  | R2  | 0  | from bandwidth (tuned by ear)    |
| bandstop        | 1  | 0   | 1  | from bandwidth                   |
| drive only      | –  | –   | –  | no filtering, shaper only        |

Coefficients are recomputed lazily: modulation setters only raise a flag,
and the next `process` call pays for the tan().
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Off,
    LowPass,
    HighPass,
    BandPassSkirt,
    BandPassPeak,
    BandStop,
    DriveOnly,
}

impl FilterMode {
    pub const ALL: [FilterMode; 7] = [
        Self::Off,
        Self::LowPass,
        Self::HighPass,
        Self::BandPassSkirt,
        Self::BandPassPeak,
        Self::BandStop,
        Self::DriveOnly,
    ];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[math::selector(value, Self::ALL.len()).min(Self::ALL.len() - 1)]
    }
}

/// Simultaneous outputs of the SVF core.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
}

#[derive(Debug, Clone)]
pub struct SVFilter {
    mode: FilterMode,

    base_freq: f32,
    env_mod: f32,
    static_mod: f32,
    resonance: f32,
    bandwidth: f32,
    drive: f32,
    output_level: f32,

    cutoff_hz: f32,
    g: f32,
    r2: f32,
    h: f32,
    c_low: f32,
    c_band: f32,
    c_high: f32,
    dirty: bool,

    s1: f32,
    s2: f32,
}

impl SVFilter {
    pub fn new(mode: FilterMode) -> Self {
        let mut filter = Self {
            mode,
            base_freq: 0.0,
            env_mod: 0.0,
            static_mod: 0.0,
            resonance: ONE_OVER_SQRT2,
            bandwidth: 2.0,
            drive: 0.0,
            output_level: 1.0,
            cutoff_hz: 0.0,
            g: 0.0,
            r2: 1.0 / ONE_OVER_SQRT2,
            h: 0.5,
            c_low: 0.0,
            c_band: 0.0,
            c_high: 0.0,
            dirty: false,
            s1: 0.0,
            s2: 0.0,
        };
        filter.set_cutoff(0.5);
        filter.calculate_coefficients();
        filter.dirty = false;
        filter
    }

    pub fn lowpass(cutoff: f32) -> Self {
        let mut filter = Self::new(FilterMode::LowPass);
        filter.set_cutoff(cutoff);
        filter
    }

    pub fn highpass(cutoff: f32) -> Self {
        let mut filter = Self::new(FilterMode::HighPass);
        filter.set_cutoff(cutoff);
        filter
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Effective cutoff in Hz as of the last coefficient update.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
        self.dirty = true;
    }

    pub fn set_mode_normalized(&mut self, value: f32) {
        self.set_mode(FilterMode::from_normalized(value));
    }

    /// Normalized cutoff, squared to spend more of the range on low
    /// frequencies.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.base_freq = cutoff * cutoff;
        self.dirty = true;
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = ONE_OVER_SQRT2 + 99.0 * resonance * resonance * resonance;
        self.bandwidth = 40.0 * resonance * resonance + 0.001;
        self.dirty = true;
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.drive = drive;
    }

    pub fn set_output_level(&mut self, level: f32) {
        self.output_level = level;
    }

    /// Envelope modulation: `amount` in [-1, 1] scaled by the envelope value.
    pub fn set_mod(&mut self, amount: f32, envelope: f32) {
        self.env_mod = math::clamp1(amount) * envelope;
        self.dirty = true;
    }

    /// Velocity, key tracking and LFO offsets.
    pub fn set_static_mod(&mut self, amount: f32) {
        self.static_mod = math::clamp1(amount);
        self.dirty = true;
    }

    fn calculate_coefficients(&mut self) {
        self.cutoff_hz = 0.5 * SAMPLE_RATE * (self.base_freq + self.env_mod + self.static_mod);
        // Keep clear of Nyquist where the integrators blow up.
        self.cutoff_hz = math::clamp(self.cutoff_hz, 20.0, SAMPLE_RATE * 0.495);
        self.g = math::tan(PI / SAMPLE_RATE * self.cutoff_hz);

        match self.mode {
            FilterMode::Off | FilterMode::DriveOnly => {
                self.r2 = 1.0 / self.resonance;
                self.c_low = 1.0;
                self.c_band = self.r2;
                self.c_high = 1.0;
            }
            FilterMode::LowPass => {
                self.r2 = 1.0 / self.resonance;
                self.c_low = 1.0;
                self.c_band = 0.0;
                self.c_high = 0.0;
            }
            FilterMode::HighPass => {
                self.r2 = 1.0 / self.resonance;
                self.c_low = 0.0;
                self.c_band = 0.0;
                self.c_high = 1.0;
            }
            FilterMode::BandPassSkirt => {
                self.r2 = 1.0 / (1.000_01 + self.bandwidth);
                self.c_low = 0.0;
                self.c_band = 1.0;
                self.c_high = 0.0;
            }
            FilterMode::BandPassPeak => {
                self.r2 = 2.0 * self.bandwidth_to_r(40.001 - 0.9654 * self.bandwidth);
                self.c_low = 0.0;
                self.c_band = self.r2;
                self.c_high = 0.0;
            }
            FilterMode::BandStop => {
                self.r2 = 2.0 * self.bandwidth_to_r(self.bandwidth);
                self.c_low = 1.0;
                self.c_band = 0.0;
                self.c_high = 1.0;
            }
        }

        self.h = 1.0 / (1.0 + self.r2 * self.g + self.g * self.g);
    }

    /// Damping for a bandwidth in octaves around the current cutoff.
    fn bandwidth_to_r(&self, bandwidth: f32) -> f32 {
        let lower_edge = self.cutoff_hz * (bandwidth * -0.5).exp2();
        let gl = math::tan(PI * lower_edge / SAMPLE_RATE);
        let r = gl / self.g;
        ((1.0 - r * r) * (1.0 - r * r) / (4.0 * r * r)).sqrt()
    }

    /// One step of the SVF core.
    #[inline]
    pub fn outputs(&mut self, input: f32) -> FilterOutputs {
        math::add_dc(&mut self.s1);
        math::add_dc(&mut self.s2);

        let highpass = (input - self.r2 * self.s1 - self.g * self.s1 - self.s2) * self.h;
        let bandpass = self.g * highpass + self.s1;
        self.s1 = self.g * highpass + bandpass;
        let lowpass = self.g * bandpass + self.s2;
        self.s2 = self.g * bandpass + lowpass;

        FilterOutputs {
            lowpass,
            bandpass,
            highpass,
        }
    }

    pub fn process(&mut self, mut input: f32) -> f32 {
        math::add_dc(&mut input);

        let out = match self.mode {
            FilterMode::Off => return input,
            FilterMode::DriveOnly => input,
            _ => {
                if self.dirty {
                    self.calculate_coefficients();
                    self.dirty = false;
                }
                let y = self.outputs(input);
                self.c_low * y.lowpass + self.c_band * y.bandpass + self.c_high * y.highpass
            }
        };

        let out = if self.drive > 0.001 {
            math::tanh(out * (1.0 + 3.0 * self.drive))
        } else {
            out
        };

        self.output_level * out
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

impl Default for SVFilter {
    fn default() -> Self {
        Self::new(FilterMode::Off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::math::TAU;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * freq * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(256);
        buffer
            .get(skip..)
            .unwrap_or(buffer)
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    fn filtered_peak(filter: &mut SVFilter, freq: f32) -> f32 {
        filter.reset();
        let mut buffer = sine(freq, 2_048);
        filter.render(&mut buffer);
        peak_after_transient(&buffer)
    }

    #[test]
    fn off_mode_is_identity() {
        let mut filter = SVFilter::new(FilterMode::Off);
        filter.set_cutoff(0.1);
        filter.set_resonance(0.9);
        for x in [-1.0, -0.25, 0.0, 0.5, 3.0] {
            assert!((filter.process(x) - x).abs() < 1e-9, "x = {}", x);
        }
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut filter = SVFilter::lowpass(0.3);
        let mut buffer = vec![1.0; 512];
        filter.render(&mut buffer);
        assert!(buffer[511] > 0.99, "got {}", buffer[511]);
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut filter = SVFilter::highpass(0.3);
        let mut buffer = vec![1.0; 2_048];
        filter.render(&mut buffer);
        assert!(buffer[2_047].abs() < 0.001, "got {}", buffer[2_047]);
    }

    #[test]
    fn lowpass_attenuates_above_cutoff() {
        // 0.1² · 22050 ≈ 220 Hz
        let mut filter = SVFilter::lowpass(0.1);
        let pass = filtered_peak(&mut filter, 50.0);
        let stop = filtered_peak(&mut filter, 5_000.0);
        assert!(pass > 0.8, "pass {}", pass);
        assert!(stop < 0.05, "stop {}", stop);
    }

    #[test]
    fn bandstop_rejects_centre() {
        let mut filter = SVFilter::new(FilterMode::BandStop);
        filter.set_cutoff((1_000.0f32 / (0.5 * SAMPLE_RATE)).sqrt());
        filter.set_resonance(0.2);
        let centre = filtered_peak(&mut filter, 1_000.0);
        let away = filtered_peak(&mut filter, 100.0);
        assert!(centre * 2.0 < away, "centre {} away {}", centre, away);
    }

    #[test]
    fn cutoff_is_clamped_below_nyquist() {
        let mut filter = SVFilter::lowpass(1.0);
        filter.set_static_mod(1.0);
        filter.process(0.0);
        assert!(filter.cutoff_hz() <= SAMPLE_RATE * 0.495);

        filter.set_cutoff(0.0);
        filter.set_static_mod(-1.0);
        filter.process(0.0);
        assert!(filter.cutoff_hz() >= 20.0);
    }

    #[test]
    fn resonance_stays_stable() {
        let mut filter = SVFilter::lowpass(0.5);
        filter.set_resonance(1.0);
        let mut buffer = sine(3_000.0, 8_192);
        filter.render(&mut buffer);
        assert!(buffer.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn drive_soft_clips_output() {
        let mut filter = SVFilter::new(FilterMode::DriveOnly);
        filter.set_drive(1.0);
        let y = filter.process(10.0);
        assert!(y <= 1.0 && y > 0.9, "got {}", y);
    }

    #[test]
    fn output_level_scales() {
        let mut filter = SVFilter::new(FilterMode::DriveOnly);
        filter.set_output_level(0.5);
        assert!((filter.process(0.8) - 0.4).abs() < 1e-6);
    }
}
