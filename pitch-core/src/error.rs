//! Error types for the pitch core.
//!
//! Only malformed input is an error here. A missing pitch is not an error
//! and is reported as `None` by the estimator.

use thiserror::Error;

/// A note name that does not match `[A-G](#)?<octave>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoteParseError {
    #[error("note name is empty")]
    Empty,

    #[error("invalid note letter in {0:?}, expected A-G")]
    InvalidLetter(String),

    #[error("missing or invalid octave in {0:?}")]
    InvalidOctave(String),
}

/// Detector settings that cannot produce a meaningful period window.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("silence threshold must be finite and non-negative, got {0}")]
    SilenceThreshold(f32),

    #[error("frequency bounds must be finite and positive, got {min} Hz..{max} Hz")]
    NonPositiveBounds { min: f32, max: f32 },

    #[error("minimum frequency {min} Hz is not below maximum frequency {max} Hz")]
    InvertedBounds { min: f32, max: f32 },
}

/// Invalid melody exercise input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExerciseError {
    #[error("scale degrees start at 1, got 0")]
    ZeroDegree,

    #[error("root note: {0}")]
    Root(#[from] NoteParseError),

    #[error("root frequency must be positive, got {0}")]
    RootFrequency(f32),
}

/// Any error raised by this crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Note(#[from] NoteParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Exercise(#[from] ExerciseError),
}

pub type Result<T> = std::result::Result<T, Error>;
