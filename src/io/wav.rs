//! Writing rendered audio to disk.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::Result;
use crate::SAMPLE_RATE;

/// 32-bit float stereo at the engine rate.
pub fn stereo_spec() -> WavSpec {
    WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Write an interleaved stereo buffer as a float WAV file.
pub fn write_stereo(path: impl AsRef<Path>, interleaved: &[f32]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WavWriter::create(path, stereo_spec())?;
    for &sample in interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    log::info!(
        "wrote {} frames to {}",
        interleaved.len() / 2,
        path.display()
    );
    Ok(())
}

/// Write an interleaved stereo buffer as 16-bit PCM, clipping to [-1, 1].
pub fn write_stereo_i16(path: impl AsRef<Path>, interleaved: &[f32]) -> Result<()> {
    let spec = WavSpec {
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
        ..stereo_spec()
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    {
        let mut samples = writer.get_i16_writer(interleaved.len() as u32);
        for &sample in interleaved {
            samples.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16);
        }
        samples.flush()?;
    }
    writer.finalize()?;
    Ok(())
}
