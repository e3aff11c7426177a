//! Low-level DSP primitives shared by the voices and the effects.
//!
//! Everything here is allocation-free once constructed and processes one
//! sample per call, so components can be embedded directly inside voice and
//! effect structs.

/// Circular delay lines and Schroeder allpasses.
pub mod delay;
/// Linear and exponential ADSR envelope generator.
pub mod envelope;
/// Zero-delay-feedback state variable filter.
pub mod filter;
/// IIR half-band filters and the oversampler built on them.
pub mod half_band;
pub mod math;
/// Band-unlimited oscillator with LFO and sample playback modes.
pub mod oscillator;
pub mod one_pole;

pub use delay::{AllPass, DelayLine};
pub use envelope::{EnvMode, EnvelopeGenerator, EnvelopeStage};
pub use filter::{FilterMode, SVFilter};
pub use half_band::{HalfBandFilter, Oversampler};
pub use one_pole::OnePole;
pub use oscillator::{Oscillator, OscillatorMode, OscillatorWaveform};
