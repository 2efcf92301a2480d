//! Text rendering of analysis results for the terminal.

use pitch_core::AnalysisResult;
use pitch_core::exercise::{ScaleStep, StepResult};
use pitch_core::feedback::{self, METER_RANGE_CENTS, NEUTRAL_POSITION};
use pitch_core::session::Target;
use pitch_core::tuning::CatalogNote;

/// Width of the text meter in characters.
const METER_WIDTH: usize = 21;

/// Renders the meter as a horizontal bar, flat on the left and sharp on the right.
///
/// The marker position follows [`feedback::meter_position`], flipped so
/// that sharper pitch moves right.
pub fn meter(cents: Option<f32>) -> String {
    let position = cents.map_or(NEUTRAL_POSITION, feedback::meter_position);
    let sharpest = feedback::meter_position(METER_RANGE_CENTS);
    let flattest = feedback::meter_position(-METER_RANGE_CENTS);
    let fraction = ((flattest - position) / (flattest - sharpest)).clamp(0.0, 1.0);
    let marker = (fraction * (METER_WIDTH - 1) as f32).round() as usize;
    let center = METER_WIDTH / 2;

    (0..METER_WIDTH)
        .map(|i| match i {
            _ if i == marker && cents.is_some() => '●',
            _ if i == center => '|',
            _ => '-',
        })
        .collect()
}

pub fn format_target(target: &Target) -> String {
    format!("Target: {} ({:.1} Hz)", target.name, target.frequency)
}

/// One status line for a live analysis result.
pub fn format_result(result: &AnalysisResult) -> String {
    match (result.detected_frequency, result.cents_deviation) {
        (Some(frequency), Some(cents)) => {
            let name = result.note_name.as_deref().unwrap_or("?");
            let label = result.feedback.map_or("", |f| f.label());
            format!(
                "Detected: {} ({:.1} Hz) {:+.0} cents [{}] {}",
                name,
                frequency,
                cents,
                meter(Some(cents)),
                label
            )
        }
        _ => format!("Detected: (no pitch) -- cents [{}]", meter(None)),
    }
}

/// One line per melody step of a finished take.
pub fn format_step_result(step: &ScaleStep, result: &StepResult) -> String {
    match (result.average_cents, result.feedback) {
        (Some(cents), Some(feedback)) => format!(
            "{:>4}  {:7.1} Hz  {:+5.0} cents  {} ({} samples)",
            step.label(),
            result.target_frequency,
            cents,
            feedback.label(),
            result.sample_count
        ),
        _ => format!(
            "{:>4}  {:7.1} Hz  not sung",
            step.label(),
            result.target_frequency
        ),
    }
}

/// Catalog entry as shown in a note picker, e.g. "A3 (220.0 Hz)".
pub fn format_catalog_note(note: &CatalogNote) -> String {
    format!("{} ({:.1} Hz)", note.name, note.frequency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitch_core::PitchFeedback;

    #[test]
    fn meter_marker_moves_with_pitch() {
        assert_eq!(meter(None), "----------|----------");
        assert_eq!(meter(Some(0.0)), "----------●----------");
        assert!(meter(Some(100.0)).ends_with('●'));
        assert!(meter(Some(-250.0)).starts_with('●'));
        assert_eq!(meter(Some(50.0)), "----------|----●-----");
        assert_eq!(meter(Some(-50.0)), "-----●----|----------");
    }

    #[test]
    fn formats_detected_and_silent_frames() {
        let result = AnalysisResult {
            detected_frequency: Some(221.3),
            note_name: Some("A3".to_string()),
            cents_deviation: Some(10.2),
            feedback: Some(PitchFeedback::Sharp),
        };
        let line = format_result(&result);
        assert!(line.starts_with("Detected: A3 (221.3 Hz) +10 cents"));
        assert!(line.ends_with("too high"));

        let line = format_result(&AnalysisResult::default());
        assert!(line.starts_with("Detected: (no pitch) -- cents"));
    }

    #[test]
    fn formats_steps() {
        let sung = StepResult {
            target_frequency: 220.0,
            sample_count: 12,
            average_cents: Some(-4.0),
            feedback: Some(PitchFeedback::OnPitch),
        };
        assert_eq!(
            format_step_result(&ScaleStep::new(1), &sung),
            "   1    220.0 Hz     -4 cents  on pitch (12 samples)"
        );

        let silent = StepResult {
            target_frequency: 329.6,
            sample_count: 0,
            average_cents: None,
            feedback: None,
        };
        assert_eq!(
            format_step_result(&ScaleStep::new(5), &silent),
            "   5    329.6 Hz  not sung"
        );
    }

    #[test]
    fn catalog_entry() {
        let note = CatalogNote {
            name: "A3".to_string(),
            frequency: 220.0,
        };
        assert_eq!(format_catalog_note(&note), "A3 (220.0 Hz)");
    }
}
