//! # Musical Tuning Module
//!
//! This module provides the music-theory side of the pitch trainer. It handles
//! note name parsing, MIDI numbers, frequency calculations and cent deviation
//! measurements based on equal temperament with A4 = 440 Hz.
//!
//! ## Features
//! - Note name to frequency conversions (`"A4"` -> 440 Hz)
//! - Frequency to nearest note conversions
//! - Cent deviation calculations for pitch feedback
//! - The selectable note catalog (C2 to C6)

use crate::error::NoteParseError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Reference pitch of A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

/// Sharp-only note names, indexed by pitch class (0 = C).
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lowest note offered for selection (C2).
pub const CATALOG_LOWEST_MIDI: i32 = 36;

/// Highest note offered for selection (C6).
pub const CATALOG_HIGHEST_MIDI: i32 = 84;

/// The note selected when nothing else has been chosen.
/// A3 sits comfortably inside most voice ranges.
pub const DEFAULT_TARGET_NOTE: &str = "A3";

/// A musical note resolved to equal temperament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Note name (e.g., "A4", "C#3")
    pub name: String,
    /// Exact equal-tempered frequency in Hz
    pub frequency: f32,
    /// MIDI note number (69 = A4)
    pub midi: i32,
}

/// An entry of the selectable note catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogNote {
    pub name: String,
    pub frequency: f32,
}

/// Statically computed selectable notes, C2 to C6 inclusive.
///
/// The catalog is computed once on first access.
static CATALOG: Lazy<Vec<CatalogNote>> = Lazy::new(|| {
    (CATALOG_LOWEST_MIDI..=CATALOG_HIGHEST_MIDI)
        .map(|midi| CatalogNote {
            name: note_name(midi),
            frequency: midi_to_frequency(midi),
        })
        .collect()
});

/// Returns the notes a user can pick as a target, in ascending pitch order.
///
/// The range spans C2 to C6 inclusive (49 notes), which covers most
/// vocal ranges.
pub fn available_notes() -> &'static [CatalogNote] {
    &CATALOG
}

/// Converts a MIDI note number to its equal-tempered frequency.
///
/// The formula is f = 440 * 2^((midi - 69) / 12).
pub fn midi_to_frequency(midi: i32) -> f32 {
    let semitones = f64::from(midi - A4_MIDI);
    (f64::from(A4_FREQUENCY) * (semitones / 12.0).exp2()) as f32
}

/// Builds the sharp-notation name of a MIDI note, e.g. 61 -> "C#4".
///
/// Octaves below zero are written with a minus sign (MIDI 0 is "C-1").
pub fn note_name(midi: i32) -> String {
    let note_index = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// Parses a note name such as "A4" or "c#3" into its MIDI note number.
///
/// The accepted grammar is a letter A-G (either case), an optional `#`,
/// then an integer octave. Flats are not accepted.
///
/// # Arguments
/// * `name` - Note name (e.g., "A4", "C#3")
///
/// # Returns
/// * `Ok(midi)` - MIDI note number, C4 = 60
/// * `Err(NoteParseError)` - The name does not follow the grammar
pub fn parse_note(name: &str) -> Result<i32, NoteParseError> {
    let mut chars = name.chars();
    let letter = chars.next().ok_or(NoteParseError::Empty)?;

    let base = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(NoteParseError::InvalidLetter(name.to_string())),
    };

    let rest = chars.as_str();
    let (note_index, octave_str) = match rest.strip_prefix('#') {
        Some(octave) => (base + 1, octave),
        None => (base, rest),
    };

    let digits = octave_str.strip_prefix('-').unwrap_or(octave_str);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NoteParseError::InvalidOctave(name.to_string()));
    }

    let octave: i32 = octave_str
        .parse()
        .map_err(|_| NoteParseError::InvalidOctave(name.to_string()))?;

    // B#n wraps into the next octave's C, matching the MIDI formula.
    octave
        .checked_add(1)
        .and_then(|o| o.checked_mul(12))
        .and_then(|m| m.checked_add(note_index))
        .ok_or_else(|| NoteParseError::InvalidOctave(name.to_string()))
}

/// Converts a note name to its equal-tempered frequency in Hz.
///
/// # Arguments
/// * `name` - Note name (e.g., "A4", "C#3")
///
/// # Returns
/// * `Ok(frequency)` - Frequency in Hz ("A4" is exactly 440.0)
/// * `Err(NoteParseError)` - The name is malformed (e.g., "H3" or "C")
pub fn note_to_frequency(name: &str) -> Result<f32, NoteParseError> {
    parse_note(name).map(midi_to_frequency)
}

/// Finds the nearest equal-tempered note to a frequency.
///
/// The returned note carries the exact frequency of that note, not the
/// input frequency. Halfway cases round away from zero.
///
/// # Arguments
/// * `frequency` - Input frequency in Hz
///
/// # Returns
/// * `Some(note)` - Nearest note with its name, frequency and MIDI number
/// * `None` - The frequency is not a positive finite number
pub fn frequency_to_note(frequency: f32) -> Option<Note> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return None;
    }

    let semitones = 12.0 * (f64::from(frequency) / f64::from(A4_FREQUENCY)).log2();
    let midi = (semitones + f64::from(A4_MIDI)).round() as i32;

    Some(Note {
        name: note_name(midi),
        frequency: midi_to_frequency(midi),
        midi,
    })
}

/// Calculates the deviation of a detected frequency from a target in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
///
/// A non-positive (or NaN) argument yields 0.0 rather than an error, so a
/// caller holding a placeholder target gets a neutral reading.
///
/// # Arguments
/// * `detected` - Measured frequency in Hz
/// * `target` - Target frequency in Hz
///
/// # Returns
/// * Cent deviation (positive = sharp, negative = flat)
pub fn cents_difference(detected: f32, target: f32) -> f32 {
    if !(detected > 0.0 && target > 0.0) {
        return 0.0;
    }
    1200.0 * (detected / target).log2()
}
