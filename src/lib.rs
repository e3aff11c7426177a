//! Polyphonic subtractive/FM synthesizer with a sample-accurate song
//! sequencer.
//!
//! A [`Song`] lists tracks (instruments and stereo effects), the routing
//! between them, a stream of timed events and any parameter automation. The
//! [`Sequencer`] turns it into interleaved stereo samples, one frame at a
//! time, and can be called repeatedly to stream the result.
//!
//! ```no_run
//! use songsynth::{EngineConfig, SampleBanks, Sequencer, Song, SongEvent, TrackKind, TrackSpec};
//!
//! let mut song = Song::new(vec![TrackSpec::new(TrackKind::Instrument, vec![])], 0);
//! song.events = vec![SongEvent::note_on(0, 0, 60, 100), SongEvent::note_off(96, 0, 60)];
//!
//! let mut seq = Sequencer::new(song, EngineConfig::default())?;
//! let mut out = vec![0.0; 2 * 44_100];
//! let mut progress = 0.0;
//! seq.render(&mut out, &SampleBanks::empty(), &mut progress)?;
//! # Ok::<(), songsynth::SynthError>(())
//! ```

pub mod config;
pub mod dsp;
pub mod effects;
pub mod error;
pub mod io; // Sample banks, MIDI conversion and WAV output
pub mod sequencing; // Songs, routing and the render loop
pub mod synth; // Voice management and polyphony

pub use config::EngineConfig;
pub use effects::StereoEffect;
pub use error::{Result, SynthError};
pub use io::samples::SampleBanks;
pub use sequencing::{Sequencer, Song, SongEvent, Track, TrackKind, TrackSpec};
pub use synth::{PolyHandler, SynthMessage};

/// Engine sample rate in Hz. Every time constant is derived from it.
pub const SAMPLE_RATE: f32 = 44_100.0;
/// Voices per instrument.
pub const NUM_VOICES: usize = 8;
/// Largest stereo frame count handed to one streaming `render` call.
pub const MAX_BLOCK_SIZE: usize = 2048;
