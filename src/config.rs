//! Render-time options.

use crate::sequencing::automation::DEFAULT_AUTOMATION_INTERVAL;

/// Options for a [`Sequencer`](crate::sequencing::Sequencer) run.
///
/// None of these change the reference sound with their defaults.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Samples between automation updates.
    pub automation_interval: u32,
    /// Gain applied to the master outputs.
    pub output_bus_level: Option<f32>,
    /// Soft-clip the master outputs with a rational tanh.
    pub clamp_output: bool,
    /// End the render after a second of silence once the events run out.
    pub stop_on_silence: bool,
    /// Log render progress.
    pub report_progress: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            automation_interval: DEFAULT_AUTOMATION_INTERVAL,
            output_bus_level: None,
            clamp_output: false,
            stop_on_silence: false,
            report_progress: false,
        }
    }
}

impl EngineConfig {
    pub fn with_automation_interval(mut self, interval: u32) -> Self {
        self.automation_interval = interval.max(1);
        self
    }

    pub fn with_output_bus_level(mut self, level: f32) -> Self {
        self.output_bus_level = Some(level);
        self
    }

    pub fn with_clamp_output(mut self, clamp: bool) -> Self {
        self.clamp_output = clamp;
        self
    }

    pub fn with_stop_on_silence(mut self, stop: bool) -> Self {
        self.stop_on_silence = stop;
        self
    }

    pub fn with_progress(mut self, report: bool) -> Self {
        self.report_progress = report;
        self
    }
}
