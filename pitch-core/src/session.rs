//! # Training Session Module
//!
//! The state a pitch-training front end keeps between frames: the chosen
//! target note, whether it is listening, and the detector settings. The
//! driving loop owns one session and feeds it frames; the analysis itself
//! stays stateless.

use crate::config::DetectorConfig;
use crate::error::{Error, NoteParseError};
use crate::feedback::PitchFeedback;
use crate::tuning::{self, DEFAULT_TARGET_NOTE};
use crate::{AnalysisResult, pitch};
use tracing::{debug, info, warn};

/// The note a singer is aiming for.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub frequency: f32,
}

/// A live pitch-training session.
#[derive(Debug, Clone)]
pub struct TrainingSession {
    config: DetectorConfig,
    sample_rate: u32,
    target: Target,
    listening: bool,
}

impl TrainingSession {
    /// Creates a stopped session aimed at the default note (A3).
    ///
    /// # Arguments
    /// * `config` - Detector settings, checked before use
    /// * `sample_rate` - Sample rate of the frames that will be analyzed
    pub fn new(config: DetectorConfig, sample_rate: u32) -> Result<Self, Error> {
        config.validate()?;
        let frequency = tuning::note_to_frequency(DEFAULT_TARGET_NOTE)?;
        Ok(Self {
            config,
            sample_rate,
            target: Target {
                name: DEFAULT_TARGET_NOTE.to_string(),
                frequency,
            },
            listening: false,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Changes the sample rate, e.g. once the capture device is known.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Aims the session at a new note.
    ///
    /// On a parse error the previous target is kept.
    pub fn select_target(&mut self, name: &str) -> Result<&Target, NoteParseError> {
        match tuning::note_to_frequency(name) {
            Ok(frequency) => {
                info!(target: "session", "Target set to {} ({:.1} Hz)", name, frequency);
                self.target = Target {
                    name: name.to_string(),
                    frequency,
                };
                Ok(&self.target)
            }
            Err(e) => {
                warn!(target: "session", "Ignoring target {:?}: {}", name, e);
                Err(e)
            }
        }
    }

    pub fn start(&mut self) {
        if !self.listening {
            info!(target: "session", "Listening for {}", self.target.name);
        }
        self.listening = true;
    }

    pub fn stop(&mut self) {
        if self.listening {
            info!(target: "session", "Stopped listening");
        }
        self.listening = false;
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Analyzes one frame against the current target.
    ///
    /// A stopped session returns an empty result without analyzing.
    pub fn analyze(&self, frame: &[f32]) -> AnalysisResult {
        if !self.listening {
            return AnalysisResult::default();
        }
        let result = analyze_frame(frame, self.sample_rate, &self.config, self.target.frequency);
        debug!(
            target: "session",
            "frame of {} samples: {:?} Hz, {:?} cents",
            frame.len(),
            result.detected_frequency,
            result.cents_deviation
        );
        result
    }
}

/// Runs the full analysis pipeline on a single frame.
///
/// 1. Detects the fundamental frequency
/// 2. Finds the nearest note name
/// 3. Calculates the deviation from the target in cents
///
/// # Arguments
/// * `frame` - Raw audio samples (typically 2048 samples)
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Detector settings
/// * `target_frequency` - Frequency the singer is aiming for
pub fn analyze_frame(
    frame: &[f32],
    sample_rate: u32,
    config: &DetectorConfig,
    target_frequency: f32,
) -> AnalysisResult {
    let Some(frequency) = pitch::detect_pitch_with(frame, sample_rate, config) else {
        return AnalysisResult::default();
    };

    let note_name = tuning::frequency_to_note(frequency).map(|note| note.name);
    let cents = tuning::cents_difference(frequency, target_frequency);

    AnalysisResult {
        detected_frequency: Some(frequency),
        note_name,
        cents_deviation: Some(cents),
        feedback: Some(PitchFeedback::from_cents(cents)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    fn sine(frequency: f32) -> Vec<f32> {
        (0..2048)
            .map(|i| 0.5 * (2.0 * PI * frequency * i as f32 / 44100.0).sin())
            .collect()
    }

    #[test]
    fn starts_stopped_on_a3() {
        let session = TrainingSession::new(DetectorConfig::default(), 44100).unwrap();
        assert!(!session.is_listening());
        assert_eq!(session.target().name, "A3");
        assert_eq!(session.target().frequency, 220.0);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = DetectorConfig::with_range(800.0, 100.0);
        assert!(matches!(
            TrainingSession::new(config, 44100),
            Err(Error::Config(ConfigError::InvertedBounds { .. }))
        ));
    }

    #[test]
    fn stopped_session_reports_nothing() {
        let session = TrainingSession::new(DetectorConfig::default(), 44100).unwrap();
        assert_eq!(session.analyze(&sine(220.0)), AnalysisResult::default());
    }

    #[test]
    fn invalid_target_keeps_previous() {
        let mut session = TrainingSession::new(DetectorConfig::default(), 44100).unwrap();
        session.select_target("E4").unwrap();
        assert!(session.select_target("H3").is_err());
        assert_eq!(session.target().name, "E4");
    }

    #[test]
    fn listening_session_compares_with_target() {
        let mut session = TrainingSession::new(DetectorConfig::default(), 44100).unwrap();
        session.select_target("A3").unwrap();
        session.start();

        let result = session.analyze(&sine(220.0));
        assert_abs_diff_eq!(result.detected_frequency.unwrap(), 220.0, epsilon = 1.0);
        assert_eq!(result.note_name.as_deref(), Some("A3"));
        assert_eq!(result.feedback, Some(PitchFeedback::OnPitch));

        session.select_target("C4").unwrap();
        let result = session.analyze(&sine(220.0));
        assert_eq!(result.feedback, Some(PitchFeedback::Flat));
        assert!(result.cents_deviation.unwrap() < -250.0);

        let result = session.analyze(&[0.0; 2048]);
        assert!(result.is_empty());

        session.stop();
        assert!(!session.is_listening());
    }
}
