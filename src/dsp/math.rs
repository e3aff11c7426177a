//! Numeric helpers shared by every processor.
//!
//! The transcendental functions default to cheap approximations (rational
//! tanh, parabolic sine). These define the reference sound of the engine;
//! the `precise-math` feature swaps in the std implementations.

/// Single-precision two times pi, rounded the way the reference tables expect.
pub const TAU: f32 = 6.283_185_4;
pub const PI: f32 = 3.141_592_7;
pub const HALF_PI: f32 = 0.5 * PI;
pub const ONE_OVER_SQRT2: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Equal-tempered semitone up / down ratios.
pub const SEMITONE_UP: f32 = 1.059_463_1;
pub const SEMITONE_DOWN: f32 = 0.943_874_3;

const ANTI_DENORMAL_DC: f32 = 1.0e-18;

/// Nudge a value away from the denormal range.
#[inline]
pub fn add_dc(value: &mut f32) {
    *value += ANTI_DENORMAL_DC;
}

/// Round to the nearest integer.
#[inline]
pub fn clrintf(value: f32) -> i32 {
    value.round() as i32
}

#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Clamp to the bipolar unit range.
#[inline]
pub fn clamp1(value: f32) -> f32 {
    clamp(value, -1.0, 1.0)
}

#[inline]
pub fn clamp01(value: f32) -> f32 {
    clamp(value, 0.0, 1.0)
}

/// Normalized selector to an enum index: `round(value * (count - 1))`.
#[inline]
pub fn selector(value: f32, count: usize) -> usize {
    clrintf(value * (count.saturating_sub(1)) as f32).max(0) as usize
}

/// Rational tanh approximation, exact ±1 outside [-3, 3].
#[inline]
pub fn rational_tanh(x: f32) -> f32 {
    if x < -3.0 {
        -1.0
    } else if x > 3.0 {
        1.0
    } else {
        x * (27.0 + x * x) / (27.0 + 9.0 * x * x)
    }
}

/// Parabolic sine approximation with input wrapped to [-π, π].
#[inline]
pub fn fast_sin(mut x: f32) -> f32 {
    while x.abs() > PI {
        if x < -PI {
            x += TAU;
        } else if x > PI {
            x -= TAU;
        }
    }

    if x < 0.0 {
        1.273_239_5 * x + 0.405_284_73 * x * x
    } else {
        1.273_239_5 * x - 0.405_284_73 * x * x
    }
}

#[inline]
pub fn fast_cos(x: f32) -> f32 {
    fast_sin(x + HALF_PI)
}

#[inline]
pub fn fast_tan(x: f32) -> f32 {
    fast_sin(x) / fast_cos(x)
}

#[cfg(not(feature = "precise-math"))]
#[inline]
pub fn tanh(x: f32) -> f32 {
    rational_tanh(x)
}

#[cfg(feature = "precise-math")]
#[inline]
pub fn tanh(x: f32) -> f32 {
    x.tanh()
}

#[cfg(not(feature = "precise-math"))]
#[inline]
pub fn sin(x: f32) -> f32 {
    fast_sin(x)
}

#[cfg(feature = "precise-math")]
#[inline]
pub fn sin(x: f32) -> f32 {
    x.sin()
}

#[cfg(not(feature = "precise-math"))]
#[inline]
pub fn tan(x: f32) -> f32 {
    fast_tan(x)
}

#[cfg(feature = "precise-math")]
#[inline]
pub fn tan(x: f32) -> f32 {
    x.tan()
}

/// Reference note for key tracking (E4).
pub const KEYTRACK_REFERENCE_NOTE: i32 = 64;

const fn build_note_table() -> [f32; 128] {
    // powf is not const; accumulate semitone ratios from A4 in f64 instead.
    const SEMITONE: f64 = 1.059_463_094_359_295_3;
    let mut table = [0.0f32; 128];
    let mut n = 0;
    while n < 128 {
        let mut freq = 440.0f64;
        let mut steps = n as i32 - 69;
        while steps > 0 {
            freq *= SEMITONE;
            steps -= 1;
        }
        while steps < 0 {
            freq /= SEMITONE;
            steps += 1;
        }
        table[n] = freq as f32;
        n += 1;
    }
    table
}

/// MIDI note number to frequency in Hz, A4 = 440 Hz = note 69.
pub static NOTE_FREQUENCIES: [f32; 128] = build_note_table();

/// Frequency of `note`, clamped to the MIDI range.
#[inline]
pub fn note_to_freq(note: i32) -> f32 {
    NOTE_FREQUENCIES[note.clamp(0, 127) as usize]
}

/// Note whose frequency is closest to `freq`, rounding at the midpoint
/// between neighbours. Frequencies above the table map to 127.
pub fn closest_note(freq: f32) -> i32 {
    for (note, pair) in NOTE_FREQUENCIES.windows(2).enumerate() {
        let (low, high) = (pair[0], pair[1]);
        if freq >= low && freq < high {
            let midpoint = low + (high - low) * 0.5;
            return if freq < midpoint {
                note as i32
            } else {
                note as i32 + 1
            };
        }
    }
    127
}

/// Semitone distance between two frequencies.
#[inline]
pub fn semitones_between(from: f32, to: f32) -> f32 {
    12.0 * (to / from).log2()
}
