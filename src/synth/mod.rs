//! Voices, polyphony and live control.
//!
//! This layer sits on top of the DSP primitives: a [`Voice`] wires
//! oscillators, filters and envelopes into one note, and a [`PolyHandler`]
//! owns the voice pool and is the instrument as far as the sequencer is
//! concerned.

pub mod message;
pub mod params;
pub mod poly;
pub mod voice;

pub use message::{MessageReceiver, SynthMessage};
pub use params::SynthParam;
pub use poly::PolyHandler;
pub use voice::Voice;
