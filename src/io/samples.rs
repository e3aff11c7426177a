//! Externally supplied sample buffers for the playback waveform.

use std::path::Path;

use crate::error::{Result, SynthError};

pub const NUM_SAMPLE_SLOTS: usize = 9;
pub const MAX_SAMPLE_SLOT: usize = NUM_SAMPLE_SLOTS - 1;

/// Shared empty bank for oscillators that never play samples (LFOs).
pub static NO_SAMPLES: SampleBanks = SampleBanks::empty();

/// Up to nine mono sample buffers, addressed by slot 0..=8.
#[derive(Debug, Clone, Default)]
pub struct SampleBanks {
    slots: [Vec<f32>; NUM_SAMPLE_SLOTS],
}

impl SampleBanks {
    pub const fn empty() -> Self {
        Self {
            slots: [const { Vec::new() }; NUM_SAMPLE_SLOTS],
        }
    }

    /// Samples in `slot`, empty for unknown or unfilled slots.
    #[inline]
    pub fn slot(&self, slot: usize) -> &[f32] {
        self.slots.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_slot(&mut self, slot: usize, samples: Vec<f32>) {
        if let Some(target) = self.slots.get_mut(slot) {
            *target = samples;
        } else {
            log::warn!("ignoring sample data for slot {} (max {})", slot, MAX_SAMPLE_SLOT);
        }
    }

    /// Fill `slot` from signed 8-bit PCM, centred around zero.
    pub fn set_slot_from_i8(&mut self, slot: usize, data: &[i8]) {
        let samples = data
            .iter()
            .map(|&c| ((c as f32 + 128.0) / 255.0) - 0.5)
            .collect();
        self.set_slot(slot, samples);
    }

    /// Load a WAV file into `slot`, downmixing to mono.
    pub fn load_wav(&mut self, slot: usize, path: impl AsRef<Path>) -> Result<()> {
        if slot > MAX_SAMPLE_SLOT {
            return Err(SynthError::InvalidSong(format!(
                "sample slot {} out of range",
                slot
            )));
        }

        let mut reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let mono = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        log::debug!(
            "loaded {} into sample slot {} ({} Hz, {} ch)",
            path.as_ref().display(),
            slot,
            spec.sample_rate,
            spec.channels
        );
        self.set_slot(slot, mono);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_slots_read_as_empty() {
        let banks = SampleBanks::empty();
        assert!(banks.slot(0).is_empty());
        assert!(banks.slot(42).is_empty());
    }

    #[test]
    fn i8_conversion_is_centred() {
        let mut banks = SampleBanks::default();
        banks.set_slot_from_i8(1, &[-128, 127]);
        let slot = banks.slot(1);
        assert!((slot[0] + 0.5).abs() < 1e-6);
        assert!((slot[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let mut banks = SampleBanks::empty();
        banks.set_slot(9, vec![1.0]);
        assert!(banks.slot(9).is_empty());
    }
}
