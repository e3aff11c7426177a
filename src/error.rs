//! Error type shared by the engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    /// Raised by the `strict-params` build instead of clamping.
    #[error("parameter {id} out of range: {value}")]
    ParameterOutOfRange { id: u16, value: f32 },

    #[error("no track at index {0}")]
    UnknownTrack(usize),

    #[error("invalid song data: {0}")]
    InvalidSong(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, SynthError>;

/// Map a raw parameter value into [0, 1].
///
/// The default build clamps silently; the `strict-params` build rejects
/// anything outside the range.
#[inline]
pub fn normalize_param(id: u16, value: f32) -> Result<f32> {
    if cfg!(feature = "strict-params") && !(0.0..=1.0).contains(&value) {
        return Err(SynthError::ParameterOutOfRange { id, value });
    }
    Ok(value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "strict-params"))]
    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(normalize_param(3, 1.5).ok(), Some(1.0));
        assert_eq!(normalize_param(3, -0.5).ok(), Some(0.0));
    }

    #[cfg(feature = "strict-params")]
    #[test]
    fn out_of_range_values_are_rejected() {
        match normalize_param(3, 1.5) {
            Err(SynthError::ParameterOutOfRange { id, value }) => {
                assert_eq!(id, 3);
                assert_eq!(value, 1.5);
            }
            other => panic!("expected range error, got {:?}", other),
        }
    }

    #[test]
    fn in_range_values_pass_through() {
        assert_eq!(normalize_param(0, 0.25).ok(), Some(0.25));
    }
}
