//! # Melody Exercise Module
//!
//! Short sing-back melodies written as major-scale degrees relative to a
//! root note. A take collects every frequency detected while a step was
//! due and scores each step by its average cent deviation.

use crate::error::ExerciseError;
use crate::feedback::{self, ON_PITCH_THRESHOLD_CENTS, PitchFeedback};
use crate::tuning::{self, DEFAULT_TARGET_NOTE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Semitone offsets of the major scale degrees 1 to 7.
const MAJOR_SCALE: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Tempo used when none (or zero) is given.
pub const DEFAULT_TEMPO_BPM: u32 = 60;

/// Beats counted out ("3... 2... 1...") before the first step.
pub const COUNT_IN_BEATS: u32 = 3;

/// One note of a melody, relative to the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleStep {
    /// 1-based major scale degree; 8 is the octave above the root
    pub degree: u8,
    /// Raise the degree by a semitone
    #[serde(default)]
    pub sharp: bool,
    /// Whole octaves to shift by (+1 up, -1 down)
    #[serde(default)]
    pub octave_offset: i8,
}

impl ScaleStep {
    pub fn new(degree: u8) -> Self {
        Self {
            degree,
            sharp: false,
            octave_offset: 0,
        }
    }

    pub fn sharp(mut self) -> Self {
        self.sharp = true;
        self
    }

    pub fn octave(mut self, offset: i8) -> Self {
        self.octave_offset = offset;
        self
    }

    /// Distance from the root in semitones.
    pub fn semitones(&self) -> Result<i32, ExerciseError> {
        if self.degree == 0 {
            return Err(ExerciseError::ZeroDegree);
        }
        let index = i32::from(self.degree - 1);
        let scale = MAJOR_SCALE[(index % 7) as usize] + 12 * (index / 7);
        Ok(scale + i32::from(self.sharp) + 12 * i32::from(self.octave_offset))
    }

    /// Display label such as `"3"`, `"4#"`, `"5↑"` or `"1↓"`.
    pub fn label(&self) -> String {
        let mut label = self.degree.to_string();
        if self.sharp {
            label.push('#');
        }
        match self.octave_offset.signum() {
            1 => label.push('↑'),
            -1 => label.push('↓'),
            _ => {}
        }
        label
    }
}

/// Converts a scale step to a frequency relative to a root frequency.
///
/// # Arguments
/// * `step` - Scale degree with its sharp and octave modifiers
/// * `root_frequency` - Frequency of degree 1 in Hz
///
/// # Returns
/// * `Ok(frequency)` - Equal-tempered frequency of the step
/// * `Err(ExerciseError)` - Degree 0 or a non-positive root
pub fn scale_degree_to_frequency(
    step: ScaleStep,
    root_frequency: f32,
) -> Result<f32, ExerciseError> {
    if !(root_frequency.is_finite() && root_frequency > 0.0) {
        return Err(ExerciseError::RootFrequency(root_frequency));
    }
    let semitones = step.semitones()?;
    Ok(root_frequency * (semitones as f32 / 12.0).exp2())
}

/// A melody to sing back, one step per beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyExercise {
    /// Root note name, e.g. "A3"
    pub root: String,
    pub tempo_bpm: u32,
    pub steps: Vec<ScaleStep>,
}

impl Default for MelodyExercise {
    /// Root, third, fifth and octave over A3.
    fn default() -> Self {
        Self {
            root: DEFAULT_TARGET_NOTE.to_string(),
            tempo_bpm: DEFAULT_TEMPO_BPM,
            steps: vec![
                ScaleStep::new(1),
                ScaleStep::new(3),
                ScaleStep::new(5),
                ScaleStep::new(1).octave(1),
            ],
        }
    }
}

impl MelodyExercise {
    /// Creates an exercise, checking the root and every step up front.
    pub fn new(
        root: &str,
        tempo_bpm: u32,
        steps: Vec<ScaleStep>,
    ) -> Result<Self, ExerciseError> {
        let exercise = Self {
            root: root.to_string(),
            tempo_bpm,
            steps,
        };
        exercise.targets()?;
        Ok(exercise)
    }

    pub fn root_frequency(&self) -> Result<f32, ExerciseError> {
        Ok(tuning::note_to_frequency(&self.root)?)
    }

    /// Target frequency of each step, in order.
    pub fn targets(&self) -> Result<Vec<f32>, ExerciseError> {
        let root = self.root_frequency()?;
        self.steps
            .iter()
            .map(|&step| scale_degree_to_frequency(step, root))
            .collect()
    }

    /// Tempo actually used; zero falls back to [`DEFAULT_TEMPO_BPM`].
    pub fn tempo(&self) -> u32 {
        if self.tempo_bpm == 0 {
            DEFAULT_TEMPO_BPM
        } else {
            self.tempo_bpm
        }
    }

    /// Length of one step (one beat).
    pub fn note_duration(&self) -> Duration {
        Duration::from_secs_f64(60.0 / f64::from(self.tempo()))
    }

    /// Length of the count-in that precedes the first step.
    pub fn count_in(&self) -> Duration {
        self.note_duration() * COUNT_IN_BEATS
    }

    /// Number to call out `elapsed` into the count-in (3, 2, then 1), or
    /// `None` once it is over and recording should start.
    pub fn count_in_beat(&self, elapsed: Duration) -> Option<u32> {
        let beat = (elapsed.as_secs_f64() / self.note_duration().as_secs_f64()) as u32;
        (beat < COUNT_IN_BEATS).then(|| COUNT_IN_BEATS - beat)
    }

    pub fn total_duration(&self) -> Duration {
        self.note_duration() * self.steps.len() as u32
    }

    /// Index of the step due after `elapsed`, or `None` once the melody is over.
    pub fn step_at(&self, elapsed: Duration) -> Option<usize> {
        let index = (elapsed.as_secs_f64() / self.note_duration().as_secs_f64()) as usize;
        (index < self.steps.len()).then_some(index)
    }
}

/// Score of one melody step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub target_frequency: f32,
    pub sample_count: usize,
    /// `None` when nothing was detected during the step
    pub average_cents: Option<f32>,
    pub feedback: Option<PitchFeedback>,
}

/// Detected frequencies collected while singing a melody.
#[derive(Debug, Clone)]
pub struct ExerciseTake {
    targets: Vec<f32>,
    samples: Vec<Vec<f32>>,
}

impl ExerciseTake {
    pub fn new(exercise: &MelodyExercise) -> Result<Self, ExerciseError> {
        let targets = exercise.targets()?;
        let samples = vec![Vec::new(); targets.len()];
        Ok(Self { targets, samples })
    }

    /// Records a detected frequency for a step and returns its live deviation.
    ///
    /// Steps past the end of the melody are ignored.
    pub fn record(&mut self, step: usize, frequency: f32) -> Option<f32> {
        let target = *self.targets.get(step)?;
        self.samples[step].push(frequency);
        Some(tuning::cents_difference(frequency, target))
    }

    pub fn results(&self) -> Vec<StepResult> {
        self.targets
            .iter()
            .zip(&self.samples)
            .map(|(&target_frequency, samples)| {
                let average_cents = feedback::average_cents(samples, target_frequency);
                StepResult {
                    target_frequency,
                    sample_count: samples.len(),
                    average_cents,
                    feedback: average_cents.map(PitchFeedback::from_cents),
                }
            })
            .collect()
    }

    /// True when every step was sung and averaged within the on-pitch threshold.
    pub fn all_on_pitch(&self) -> bool {
        self.results().iter().all(|result| {
            result
                .average_cents
                .is_some_and(|cents| cents.abs() <= ON_PITCH_THRESHOLD_CENTS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::note_to_frequency;
    use approx::assert_abs_diff_eq;

    #[test]
    fn degrees_follow_the_major_scale() {
        let semitones: Vec<i32> = (1..=8)
            .map(|d| ScaleStep::new(d).semitones().unwrap())
            .collect();
        assert_eq!(semitones, vec![0, 2, 4, 5, 7, 9, 11, 12]);
        assert_eq!(ScaleStep::new(9).semitones(), Ok(14));
        assert_eq!(ScaleStep::new(4).sharp().semitones(), Ok(6));
        assert_eq!(ScaleStep::new(1).octave(-1).semitones(), Ok(-12));
        assert_eq!(ScaleStep::new(0).semitones(), Err(ExerciseError::ZeroDegree));
    }

    #[test]
    fn fifth_of_a3_is_e4() {
        let root = note_to_frequency("A3").unwrap();
        let fifth = scale_degree_to_frequency(ScaleStep::new(5), root).unwrap();
        assert_abs_diff_eq!(fifth, note_to_frequency("E4").unwrap(), epsilon = 1e-2);
        assert_eq!(
            scale_degree_to_frequency(ScaleStep::new(5), 0.0),
            Err(ExerciseError::RootFrequency(0.0))
        );
    }

    #[test]
    fn labels() {
        assert_eq!(ScaleStep::new(3).label(), "3");
        assert_eq!(ScaleStep::new(4).sharp().label(), "4#");
        assert_eq!(ScaleStep::new(5).octave(1).label(), "5↑");
        assert_eq!(ScaleStep::new(1).octave(-1).label(), "1↓");
    }

    #[test]
    fn timing_follows_tempo() {
        let exercise = MelodyExercise::new("C4", 120, vec![ScaleStep::new(1); 4]).unwrap();
        assert_eq!(exercise.note_duration(), Duration::from_millis(500));
        assert_eq!(exercise.total_duration(), Duration::from_secs(2));
        assert_eq!(exercise.step_at(Duration::ZERO), Some(0));
        assert_eq!(exercise.step_at(Duration::from_millis(1250)), Some(2));
        assert_eq!(exercise.step_at(Duration::from_secs(2)), None);

        let still = MelodyExercise::new("C4", 0, vec![ScaleStep::new(1)]).unwrap();
        assert_eq!(still.tempo(), DEFAULT_TEMPO_BPM);
        assert_eq!(still.note_duration(), Duration::from_secs(1));
    }

    #[test]
    fn count_in_lasts_three_beats() {
        let exercise = MelodyExercise::new("C4", 120, vec![ScaleStep::new(1); 4]).unwrap();
        assert_eq!(exercise.count_in(), Duration::from_millis(1500));
        assert_eq!(exercise.count_in_beat(Duration::ZERO), Some(3));
        assert_eq!(exercise.count_in_beat(Duration::from_millis(600)), Some(2));
        assert_eq!(exercise.count_in_beat(Duration::from_millis(1499)), Some(1));
        assert_eq!(exercise.count_in_beat(Duration::from_millis(1500)), None);

        let default = MelodyExercise::default();
        assert_eq!(default.count_in(), Duration::from_secs(3));
    }

    #[test]
    fn rejects_bad_root() {
        assert!(matches!(
            MelodyExercise::new("H2", 60, vec![ScaleStep::new(1)]),
            Err(ExerciseError::Root(_))
        ));
    }

    #[test]
    fn take_scores_each_step() {
        let exercise = MelodyExercise::default();
        let targets = exercise.targets().unwrap();
        let mut take = ExerciseTake::new(&exercise).unwrap();

        for (step, &target) in targets.iter().enumerate().take(3) {
            take.record(step, target);
        }
        assert_eq!(take.record(99, 440.0), None);
        assert!(!take.all_on_pitch());

        let sharp = targets[3] * 2f32.powf(30.0 / 1200.0);
        let cents = take.record(3, sharp).unwrap();
        assert_abs_diff_eq!(cents, 30.0, epsilon = 1e-2);

        let results = take.results();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].feedback, Some(PitchFeedback::OnPitch));
        assert_eq!(results[3].feedback, Some(PitchFeedback::Sharp));
        assert!(!take.all_on_pitch());
    }

    #[test]
    fn take_all_on_pitch() {
        let exercise = MelodyExercise::default();
        let mut take = ExerciseTake::new(&exercise).unwrap();
        for (step, target) in exercise.targets().unwrap().into_iter().enumerate() {
            take.record(step, target * 2f32.powf(5.0 / 1200.0));
        }
        assert!(take.all_on_pitch());
    }
}
