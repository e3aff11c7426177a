//! Real-world scenario benchmarks.
//!
//! These benchmarks model how the engine is actually driven: full instrument
//! patches with several voices held, and whole songs through the sequencer.

mod song;
mod voices;

pub use song::bench_song;
pub use voices::bench_voices;
