//! Streaming a song to the default output device.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};

use songsynth::{SampleBanks, Sequencer, MAX_BLOCK_SIZE, SAMPLE_RATE};

/// Shared audio state
struct AudioState {
    sequencer: Sequencer,
    banks: SampleBanks,
    /// Interleaved stereo scratch for one block.
    block: Vec<f32>,
}

/// Pick an f32 output config at the engine rate, or the device default.
fn output_config(device: &cpal::Device) -> EyreResult<StreamConfig> {
    let wanted = SampleRate(SAMPLE_RATE as u32);
    let matching = device
        .supported_output_configs()
        .wrap_err("failed to query output configs")?
        .filter(|range| range.sample_format() == SampleFormat::F32)
        .find(|range| range.min_sample_rate() <= wanted && wanted <= range.max_sample_rate());

    if let Some(range) = matching {
        return Ok(range.with_sample_rate(wanted).into());
    }

    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;
    log::warn!(
        "device has no f32 stream at {} Hz, playing at {} Hz",
        wanted.0,
        config.sample_rate().0
    );
    Ok(config.into())
}

/// Render `sequencer` in real time until it reports the song finished.
pub fn play(sequencer: Sequencer, banks: SampleBanks) -> EyreResult<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = output_config(&device)?;
    let channels = (config.channels as usize).max(1);

    log::info!(
        "playing on {} ({} Hz, {} ch)",
        device.name().unwrap_or_else(|_| "unknown device".into()),
        config.sample_rate.0,
        channels
    );

    let state = Arc::new(Mutex::new(AudioState {
        sequencer,
        banks,
        block: vec![0.0; 2 * MAX_BLOCK_SIZE],
    }));

    let state_clone = state.clone();
    let mut progress = 0.0;
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _| {
                let Ok(mut state) = state_clone.lock() else {
                    data.fill(0.0);
                    return;
                };
                // Destructure to allow simultaneous mutable borrows
                let AudioState {
                    sequencer,
                    banks,
                    block,
                } = &mut *state;

                for chunk in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                    let frames = chunk.len() / channels;
                    let block = &mut block[..2 * frames];
                    if let Err(err) = sequencer.render(block, banks, &mut progress) {
                        log::error!("render failed: {}", err);
                        block.fill(0.0);
                    }
                    for (out, stereo) in chunk.chunks_exact_mut(channels).zip(block.chunks_exact(2)) {
                        match out {
                            [mono] => *mono = 0.5 * (stereo[0] + stereo[1]),
                            [left, right, rest @ ..] => {
                                *left = stereo[0];
                                *right = stereo[1];
                                rest.fill(0.0);
                            }
                            [] => {}
                        }
                    }
                }
            },
            |err| log::error!("audio error: {}", err),
            None,
        )
        .wrap_err("failed to build output stream")?;

    stream.play().wrap_err("failed to start output stream")?;

    loop {
        std::thread::sleep(Duration::from_millis(100));
        let finished = state
            .lock()
            .map_err(|_| eyre!("audio thread panicked"))?
            .sequencer
            .is_finished();
        if finished {
            break;
        }
    }
    // Let the device drain its last buffer.
    std::thread::sleep(Duration::from_millis(200));
    Ok(())
}
