//! songsynth - render a song and play it
//!
//! Run with: cargo run -- [SONG.json] [--wav OUT.wav] [--sample SLOT=FILE.wav] [--no-play]
//! (`--help` lists every option)
//!
//! Without a song file the built-in demo is played. Loading songs from JSON
//! needs the `serde` feature. `RUST_LOG=debug` shows render progress.

mod demo;
mod playback;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use simple_logger::SimpleLogger;

use songsynth::io::wav;
use songsynth::{EngineConfig, SampleBanks, Sequencer, Song, SAMPLE_RATE};

/// Longest tail rendered after the last event before giving up on silence.
const MAX_TAIL_SECONDS: usize = 30;

#[derive(Parser, Debug)]
#[command(name = "songsynth")]
#[command(author, version, about = "Render a song and play it")]
struct Args {
    /// Song description (.json). The built-in demo plays when omitted.
    song: Option<PathBuf>,

    /// Also write the full render to this WAV file
    #[arg(long, value_name = "OUT.wav")]
    wav: Option<PathBuf>,

    /// Load a WAV into a sample bank slot (0-8), e.g. `--sample 0=kick.wav`
    #[arg(long = "sample", value_name = "SLOT=FILE", value_parser = parse_sample)]
    samples: Vec<(usize, PathBuf)>,

    /// Skip audio playback
    #[arg(long)]
    no_play: bool,

    /// Print the song as JSON and exit
    #[arg(long)]
    dump_json: bool,
}

fn parse_sample(value: &str) -> Result<(usize, PathBuf), String> {
    let (slot, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=FILE, got `{}`", value))?;
    let slot = slot
        .parse()
        .map_err(|_| format!("invalid sample slot `{}`", slot))?;
    if path.is_empty() {
        return Err(format!("missing file name for slot {}", slot));
    }
    Ok((slot, path.into()))
}

#[cfg(feature = "serde")]
fn load_song(path: &Path) -> EyreResult<Song> {
    let json = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Song::from_json(&json).wrap_err_with(|| format!("failed to load {}", path.display()))
}

#[cfg(not(feature = "serde"))]
fn load_song(path: &Path) -> EyreResult<Song> {
    Err(color_eyre::eyre::eyre!(
        "loading {} needs the `serde` feature",
        path.display()
    ))
}

#[cfg(feature = "serde")]
fn dump_json(song: &Song) -> EyreResult<()> {
    println!("{}", song.to_json()?);
    Ok(())
}

#[cfg(not(feature = "serde"))]
fn dump_json(_song: &Song) -> EyreResult<()> {
    Err(color_eyre::eyre::eyre!("--dump-json needs the `serde` feature"))
}

fn render_config() -> EngineConfig {
    EngineConfig::default().with_stop_on_silence(true)
}

/// Render the whole song in one pass, cut at the point it fell silent.
fn render_offline(song: Song, banks: &SampleBanks) -> EyreResult<Vec<f32>> {
    let frames = song.length_in_samples() as usize + MAX_TAIL_SECONDS * SAMPLE_RATE as usize;
    let mut sequencer = Sequencer::new(song, render_config().with_progress(true))?;

    let mut out = vec![0.0; 2 * frames];
    let mut progress = 0.0;
    sequencer.render(&mut out, banks, &mut progress)?;
    out.truncate(2 * sequencer.position() as usize);
    Ok(out)
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let args = Args::parse();

    let song = match &args.song {
        Some(path) => load_song(path)?,
        None => demo::song(),
    };
    if args.dump_json {
        return dump_json(&song);
    }

    let mut banks = SampleBanks::empty();
    for (slot, path) in &args.samples {
        banks
            .load_wav(*slot, path)
            .wrap_err_with(|| format!("failed to load sample {}", path.display()))?;
    }

    log::info!(
        "{} tracks, {} events, {:.1} s",
        song.tracks.len(),
        song.events.len(),
        song.length_in_samples() as f32 / SAMPLE_RATE
    );

    if let Some(path) = &args.wav {
        let rendered = render_offline(song.clone(), &banks)?;
        wav::write_stereo(path, &rendered)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    }

    if !args.no_play {
        let sequencer = Sequencer::new(song, render_config())?;
        playback::play(sequencer, banks)?;
    }
    Ok(())
}
