//! Note names and the pitch table.
//!
//! The table is built once on first use and never mutated. It covers
//! octaves 0 through 8 in twelve-tone equal temperament (A4 = 440 Hz), with
//! sharp (`C#4`) and flat (`Db4`) spellings, and frequencies rounded to
//! hundredths of a hertz.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/// Tuning reference: A4.
pub const TUNING_PITCH: f64 = 440.0;

/// Names accepted as an explicit silence, compared case-insensitively.
const REST_MARKERS: [&str; 3] = ["REST", "R", "-"];

/// Spellings for each semitone above C.
const SEMITONE_NAMES: [&[&str]; 12] = [
    &["C"],
    &["C#", "Db"],
    &["D"],
    &["D#", "Eb"],
    &["E"],
    &["F"],
    &["F#", "Gb"],
    &["G"],
    &["G#", "Ab"],
    &["A"],
    &["A#", "Bb"],
    &["B"],
];

static NOTE_TABLE: LazyLock<HashMap<String, f64>> = LazyLock::new(|| {
    let mut table = HashMap::with_capacity(9 * 17);
    for octave in 0..=8 {
        for (semitone, names) in SEMITONE_NAMES.iter().enumerate() {
            let midi = (octave + 1) * 12 + semitone as i32;
            let hz = (midi_to_frequency(midi, TUNING_PITCH) * 100.0).round() / 100.0;
            for name in names.iter() {
                table.insert(format!("{name}{octave}"), hz);
            }
        }
    }
    table
});

/// Convert a MIDI note number to frequency using the given tuning pitch.
///
/// Formula: `tuning_pitch * 2^((midi - 69) / 12)`
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * (2.0_f64).powf((midi as f64 - 69.0) / 12.0)
}

/// Look a note name up in the pitch table.
pub fn lookup(name: &str) -> Option<f64> {
    NOTE_TABLE.get(name).copied()
}

/// True if `name` is one of the rest markers.
pub fn is_rest(name: &str) -> bool {
    REST_MARKERS.iter().any(|m| m.eq_ignore_ascii_case(name.trim()))
}

/// A resolved note: silence or a named pitch.
#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Rest,
    Pitch { name: String, frequency: f64 },
}

impl Note {
    /// Resolve a note name. Unknown names are an error, never silence.
    pub fn parse(name: &str) -> Result<Note> {
        let name = name.trim();
        if is_rest(name) {
            return Ok(Note::Rest);
        }
        match lookup(name) {
            Some(frequency) => Ok(Note::Pitch {
                name: name.to_string(),
                frequency,
            }),
            None => Err(SynthError::UnknownNote(name.to_string())),
        }
    }

    /// Frequency in Hz; 0 for a rest.
    pub fn frequency(&self) -> f64 {
        match self {
            Note::Rest => 0.0,
            Note::Pitch { frequency, .. } => *frequency,
        }
    }
}

/// A pitch as written in a score: a note name or a literal frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pitch {
    Hz(f64),
    Name(String),
}

impl Pitch {
    pub fn frequency(&self) -> Result<f64> {
        match self {
            Pitch::Hz(hz) => {
                if !hz.is_finite() || *hz < 0.0 {
                    return Err(SynthError::InvalidFrequency(*hz));
                }
                Ok(*hz)
            }
            Pitch::Name(name) => Ok(Note::parse(name)?.frequency()),
        }
    }
}

impl From<&str> for Pitch {
    fn from(name: &str) -> Self {
        Pitch::Name(name.to_string())
    }
}

impl From<f64> for Pitch {
    fn from(hz: f64) -> Self {
        Pitch::Hz(hz)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pitch::Hz(hz) => write!(f, "{hz} Hz"),
            Pitch::Name(name) => f.write_str(name),
        }
    }
}
