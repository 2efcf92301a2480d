// pitch-core/src/lib.rs

//! The core logic for the vocal pitch trainer.
//! This crate is responsible for pitch detection, note and frequency
//! conversions, and cent deviation feedback. It is completely headless
//! and performs no audio I/O.

pub mod config;
pub mod error;
pub mod exercise;
pub mod feedback;
pub mod pitch;
pub mod session;
pub mod tuning;

pub use config::DetectorConfig;
pub use error::{Error, Result};
pub use feedback::PitchFeedback;
pub use session::TrainingSession;

/// Represents the result of a single audio analysis frame.
///
/// All fields are `None` together when no pitch was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    /// The detected fundamental frequency in Hz.
    pub detected_frequency: Option<f32>,
    /// The name of the nearest note.
    pub note_name: Option<String>,
    /// The deviation from the target note in cents.
    pub cents_deviation: Option<f32>,
    /// On/off-pitch classification of the deviation.
    pub feedback: Option<PitchFeedback>,
}

impl AnalysisResult {
    /// True when the frame had no detectable pitch.
    pub fn is_empty(&self) -> bool {
        self.detected_frequency.is_none()
    }
}
