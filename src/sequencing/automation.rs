use crate::dsp::math;

/// Parameter id reserved for the per-track volume multiplier.
pub const VOLUME_PARAM_ID: u16 = 127;

/// Samples between automation updates.
pub const DEFAULT_AUTOMATION_INTERVAL: u32 = 100;

/// A linear parameter ramp for one (track, parameter) pair.
///
/// The value only moves every `interval` samples, by `step`, and is clamped
/// to the target on the last update so rounding never overshoots.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AutomationEnvelope {
    pub track: usize,
    pub param_id: u16,
    /// Current value in [0, 1].
    pub value: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub samples_left: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub samples_to_next: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub step: f32,
}

impl AutomationEnvelope {
    /// Idle envelope resting at `value`.
    pub fn new(track: usize, param_id: u16, value: f32) -> Self {
        Self {
            track,
            param_id,
            value,
            target: value,
            samples_left: 0,
            samples_to_next: 0,
            step: 0.0,
        }
    }

    pub fn is_volume(&self) -> bool {
        self.param_id == VOLUME_PARAM_ID
    }

    pub fn is_running(&self) -> bool {
        self.samples_left > 0
    }

    pub fn matches(&self, track: usize, param_id: u16) -> bool {
        self.track == track && self.param_id == param_id
    }

    /// Start a ramp to `target` lasting `samples` (at least one).
    pub fn start(&mut self, target: f32, samples: u32, interval: u32) {
        let samples = samples.max(1);
        self.target = target;
        self.samples_left = samples;
        self.step = (target - self.value) / samples as f32 * interval as f32;
        // The final update must land on the last sample of the ramp.
        self.samples_to_next = self.samples_to_next.min(samples);
    }

    /// Snap to `value` without touching a running ramp's timing.
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    /// Advance one sample. Returns the new value when an update is due.
    pub fn tick(&mut self, interval: u32) -> Option<f32> {
        if self.samples_left == 0 {
            return None;
        }
        self.samples_left -= 1;
        self.samples_to_next = self.samples_to_next.saturating_sub(1);
        if self.samples_to_next >= 1 {
            return None;
        }

        self.value += self.step;
        self.samples_to_next = self.samples_left.min(interval);

        let overshot = if self.step <= 0.0 {
            self.value < self.target
        } else {
            self.value > self.target
        };
        if overshot || self.samples_left == 0 {
            self.value = self.target;
        }
        self.value = math::clamp01(self.value);
        Some(self.value)
    }
}
