//! Tunable constants of the pitch detector.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Minimum RMS level below which a frame is treated as silence.
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;

/// Lowest fundamental considered plausible for a human voice, in Hz.
pub const DEFAULT_MIN_FREQUENCY: f32 = 60.0;

/// Highest fundamental considered plausible for a human voice, in Hz.
pub const DEFAULT_MAX_FREQUENCY: f32 = 1000.0;

/// Settings for [`crate::pitch::detect_pitch_with`].
///
/// The defaults target the singing voice. Wider bounds suit other
/// monophonic instruments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Frames with an RMS level below this are rejected as silence
    pub silence_threshold: f32,
    /// Lowest frequency the detector reports, in Hz
    pub min_frequency: f32,
    /// Highest frequency the detector reports, in Hz
    pub max_frequency: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            min_frequency: DEFAULT_MIN_FREQUENCY,
            max_frequency: DEFAULT_MAX_FREQUENCY,
        }
    }
}

impl DetectorConfig {
    /// Creates a config with custom frequency bounds and the default
    /// silence threshold.
    pub fn with_range(min_frequency: f32, max_frequency: f32) -> Self {
        Self {
            min_frequency,
            max_frequency,
            ..Self::default()
        }
    }

    /// Checks that the bounds describe a non-empty frequency window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.silence_threshold.is_finite() && self.silence_threshold >= 0.0) {
            return Err(ConfigError::SilenceThreshold(self.silence_threshold));
        }

        let (min, max) = (self.min_frequency, self.max_frequency);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0) {
            return Err(ConfigError::NonPositiveBounds { min, max });
        }
        if min >= max {
            return Err(ConfigError::InvertedBounds { min, max });
        }
        Ok(())
    }

    /// Shortest and longest period, in samples, that the detector searches.
    ///
    /// Both are floored, so the shortest period may be zero when the sample
    /// rate is below `max_frequency`.
    pub fn period_range(&self, sample_rate: u32) -> (usize, usize) {
        let rate = sample_rate as f32;
        let min_period = (rate / self.max_frequency).floor() as usize;
        let max_period = (rate / self.min_frequency).floor() as usize;
        (min_period, max_period)
    }
}
