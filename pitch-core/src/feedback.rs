//! On/off-pitch feedback derived from a cent deviation.

use crate::tuning::cents_difference;
use serde::{Deserialize, Serialize};

/// Deviations within this many cents of the target count as on pitch.
pub const ON_PITCH_THRESHOLD_CENTS: f32 = 10.0;

/// The meter shows deviations from -100 to +100 cents.
pub const METER_RANGE_CENTS: f32 = 100.0;

/// Meter position, in percent from the top, for "on target" or "no pitch".
pub const NEUTRAL_POSITION: f32 = 50.0;

/// How far the meter moves per cent of deviation, in percent.
const POSITION_PER_CENT: f32 = 0.3;

/// Classification of a cent deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitchFeedback {
    /// Within the on-pitch threshold
    OnPitch,
    /// Too high
    Sharp,
    /// Too low
    Flat,
}

impl PitchFeedback {
    pub fn from_cents(cents: f32) -> Self {
        if cents.abs() <= ON_PITCH_THRESHOLD_CENTS {
            PitchFeedback::OnPitch
        } else if cents > 0.0 {
            PitchFeedback::Sharp
        } else {
            PitchFeedback::Flat
        }
    }

    /// Short label for textual displays.
    pub fn label(self) -> &'static str {
        match self {
            PitchFeedback::OnPitch => "on pitch",
            PitchFeedback::Sharp => "too high",
            PitchFeedback::Flat => "too low",
        }
    }
}

/// Maps a cent deviation to a vertical meter position in percent.
///
/// Higher pitch moves the marker up (smaller percentage): -100 cents maps
/// to 80%, 0 to 50% and +100 to 20%. Deviations beyond the meter range
/// are clamped.
pub fn meter_position(cents: f32) -> f32 {
    if cents.is_nan() {
        return NEUTRAL_POSITION;
    }
    let clamped = cents.clamp(-METER_RANGE_CENTS, METER_RANGE_CENTS);
    NEUTRAL_POSITION - clamped * POSITION_PER_CENT
}

/// Averages the cent deviation of several detected frequencies from a target.
///
/// Returns `None` when there are no samples.
pub fn average_cents(samples: &[f32], target: f32) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    let total: f32 = samples
        .iter()
        .map(|&frequency| cents_difference(frequency, target))
        .sum();
    Some(total / samples.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(PitchFeedback::from_cents(0.0), PitchFeedback::OnPitch);
        assert_eq!(PitchFeedback::from_cents(10.0), PitchFeedback::OnPitch);
        assert_eq!(PitchFeedback::from_cents(-10.0), PitchFeedback::OnPitch);
        assert_eq!(PitchFeedback::from_cents(10.5), PitchFeedback::Sharp);
        assert_eq!(PitchFeedback::from_cents(-37.0), PitchFeedback::Flat);
    }

    #[test]
    fn meter_clamps_to_range() {
        assert_eq!(meter_position(0.0), 50.0);
        assert_abs_diff_eq!(meter_position(100.0), 20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(meter_position(-100.0), 80.0, epsilon = 1e-4);
        assert_abs_diff_eq!(meter_position(450.0), 20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(meter_position(-1200.0), 80.0, epsilon = 1e-4);
        assert_eq!(meter_position(f32::NAN), NEUTRAL_POSITION);
    }

    #[test]
    fn averages_over_samples() {
        assert_eq!(average_cents(&[], 220.0), None);
        let sharp = 220.0 * 2f32.powf(20.0 / 1200.0);
        let flat = 220.0 * 2f32.powf(-10.0 / 1200.0);
        assert_abs_diff_eq!(average_cents(&[sharp, flat], 220.0).unwrap(), 5.0, epsilon = 1e-2);
    }
}
