//! Saving and loading trainer settings as JSON.

use crate::audio::{DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE};
use anyhow::{Context, Result, bail};
use pitch_core::DetectorConfig;
use pitch_core::exercise::MelodyExercise;
use pitch_core::tuning::DEFAULT_TARGET_NOTE;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Everything the trainer needs to start a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerSettings {
    pub target_note: String,
    pub buffer_size: usize,
    pub sample_rate: u32,
    pub detector: DetectorConfig,
    pub melody: MelodyExercise,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            target_note: DEFAULT_TARGET_NOTE.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
            detector: DetectorConfig::default(),
            melody: MelodyExercise::default(),
        }
    }
}

impl TrainerSettings {
    /// Rejects settings the capture path cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            bail!("buffer_size must be at least one sample");
        }
        self.detector.validate().context("detector settings")?;
        Ok(())
    }
}

/// Saves the settings to a JSON file.
///
/// # Arguments
/// * `settings` - The settings to save
/// * `path` - File path where the settings should be saved (e.g., "trainer.json")
pub fn save_settings(settings: &TrainerSettings, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(settings)?;
    let mut file = File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}

/// Loads settings from a JSON file.
///
/// Missing fields take their default values.
pub fn load_settings(path: &Path) -> Result<TrainerSettings> {
    let mut file = File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let settings: TrainerSettings = serde_json::from_str(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitch_core::exercise::ScaleStep;

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainer.json");

        let settings = TrainerSettings {
            target_note: "E3".to_string(),
            buffer_size: 4096,
            detector: DetectorConfig::with_range(80.0, 800.0),
            melody: MelodyExercise::new(
                "C3",
                90,
                vec![ScaleStep::new(1), ScaleStep::new(4).sharp()],
            )
            .unwrap(),
            ..TrainerSettings::default()
        };
        save_settings(&settings, &path).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "target_note": "G3", "detector": { "min_frequency": 70.0 } }"#)
            .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.target_note, "G3");
        assert_eq!(settings.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(settings.detector.min_frequency, 70.0);
        assert_eq!(settings.detector.max_frequency, 1000.0);
        assert_eq!(settings.melody, MelodyExercise::default());
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        assert!(TrainerSettings::default().validate().is_ok());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty-frames.json");
        std::fs::write(&path, r#"{ "buffer_size": 0 }"#).unwrap();
        let settings = load_settings(&path).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(&dir.path().join("absent.json")).is_err());
    }
}
