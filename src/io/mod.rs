//! Getting data in and out of the engine.

pub mod midi;
pub mod samples;
pub mod wav;

pub use midi::{midi_to_synth, MidiEvent};
pub use samples::SampleBanks;
