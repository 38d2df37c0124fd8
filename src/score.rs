//! Score data model.
//!
//! A [`Score`] holds one or more [`Arrangement`]s that are rendered
//! independently and summed. Each arrangement is an ordered list of
//! `(entity, duration)` entries played back to back by one [`Instrument`].
//! Everything here is plain data: it can be built in code or loaded from
//! JSON, and rendering never mutates it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::envelope::EnvelopeSpec;
use crate::dsp::oscillator::{HarmonicProfile, Voice};
use crate::dsp::reverb::ReverbConfig;
use crate::error::{Result, SynthError};
use crate::note::Pitch;
use crate::preset;
use crate::timing::DEFAULT_SAMPLE_RATE;

// ── Entities ────────────────────────────────────────────────

/// What sounds during one slot of an arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Note(Pitch),
    /// Simultaneous pitches, averaged.
    Chord(Vec<Pitch>),
    Rest,
}

impl Entity {
    pub fn note(pitch: impl Into<Pitch>) -> Self {
        Entity::Note(pitch.into())
    }

    pub fn chord<P: Into<Pitch>>(pitches: impl IntoIterator<Item = P>) -> Self {
        Entity::Chord(pitches.into_iter().map(Into::into).collect())
    }

    /// Fundamental frequencies, resolving note names. A rest has none.
    pub fn frequencies(&self) -> Result<Vec<f64>> {
        match self {
            Entity::Note(p) => Ok(vec![p.frequency()?]),
            Entity::Chord(ps) => ps.iter().map(Pitch::frequency).collect(),
            Entity::Rest => Ok(Vec::new()),
        }
    }
}

/// One slot of an arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "play")]
    pub entity: Entity,
    /// Slot length in seconds.
    pub duration: f64,
}

impl Entry {
    pub fn new(entity: Entity, duration: f64) -> Self {
        Entry { entity, duration }
    }
}

// ── Instruments ─────────────────────────────────────────────

/// How an arrangement's entities are voiced and shaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instrument {
    pub harmonics: HarmonicProfile,
    /// Detune offsets in Hz; each pitch is rendered once per offset.
    pub detune: Vec<f64>,
    /// Applied to the mixed voices of each entity.
    pub envelope: Option<EnvelopeSpec>,
    pub reverb: Option<ReverbConfig>,
    pub gain: f64,
    /// Fraction of each slot that sounds (0, 1]. The rest of the slot is
    /// silent, leaving a gap before the next entry.
    pub articulation: f64,
}

impl Default for Instrument {
    fn default() -> Self {
        Instrument {
            harmonics: HarmonicProfile::default(),
            detune: Vec::new(),
            envelope: None,
            reverb: None,
            gain: 1.0,
            articulation: 1.0,
        }
    }
}

impl Instrument {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.gain.is_finite() {
            return Err(SynthError::InvalidParameter {
                name: "gain",
                value: self.gain,
            });
        }
        if !(self.articulation > 0.0 && self.articulation <= 1.0) {
            return Err(SynthError::InvalidParameter {
                name: "articulation",
                value: self.articulation,
            });
        }
        if let Some(bad) = self.detune.iter().find(|d| !d.is_finite()) {
            return Err(SynthError::InvalidParameter {
                name: "detune",
                value: *bad,
            });
        }
        Ok(())
    }

    /// One voice per frequency and detune offset, each carrying the
    /// instrument's harmonics and gain. No detune means one undetuned copy.
    pub fn voices(&self, frequencies: &[f64]) -> Vec<Voice> {
        let offsets: &[f64] = if self.detune.is_empty() { &[0.0] } else { &self.detune };
        frequencies
            .iter()
            .flat_map(|&f| {
                offsets.iter().map(move |&d| {
                    Voice::new(f)
                        .with_harmonics(self.harmonics.clone())
                        .with_detune(d)
                        .with_gain(self.gain)
                })
            })
            .collect()
    }
}

/// An instrument given inline or by preset name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstrumentRef {
    Preset(String),
    Inline(Instrument),
}

impl Default for InstrumentRef {
    fn default() -> Self {
        InstrumentRef::Inline(Instrument::default())
    }
}

impl InstrumentRef {
    pub fn resolve(&self) -> Result<Instrument> {
        let instrument = match self {
            InstrumentRef::Preset(name) => preset::instrument(name)
                .ok_or_else(|| SynthError::UnknownInstrument(name.clone()))?,
            InstrumentRef::Inline(instrument) => instrument.clone(),
        };
        instrument.validate()?;
        Ok(instrument)
    }
}

impl From<&str> for InstrumentRef {
    fn from(name: &str) -> Self {
        InstrumentRef::Preset(name.to_string())
    }
}

impl From<Instrument> for InstrumentRef {
    fn from(instrument: Instrument) -> Self {
        InstrumentRef::Inline(instrument)
    }
}

// ── Arrangement & Score ─────────────────────────────────────

/// A line of entities played back to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrangement {
    pub name: String,
    #[serde(default)]
    pub instrument: InstrumentRef,
    pub entries: Vec<Entry>,
    /// Total length in seconds. Defaults to the sum of entry durations;
    /// entries past this length are cut off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

impl Arrangement {
    pub fn new(name: impl Into<String>, instrument: impl Into<InstrumentRef>) -> Self {
        Arrangement {
            name: name.into(),
            instrument: instrument.into(),
            entries: Vec::new(),
            length: None,
        }
    }

    pub fn push(mut self, entity: Entity, duration: f64) -> Self {
        self.entries.push(Entry::new(entity, duration));
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// Sum of entry durations in seconds.
    pub fn natural_length(&self) -> f64 {
        self.entries.iter().map(|e| e.duration).sum()
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_master_gain() -> f64 {
    1.0
}

fn default_target_peak() -> f64 {
    0.85
}

/// A complete composition plus its global render parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Total length in seconds; defaults to the longest arrangement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Scales the normalized mix, in (0, 1].
    #[serde(default = "default_master_gain")]
    pub master_gain: f64,
    /// Peak level after normalization, in (0, 1].
    #[serde(default = "default_target_peak")]
    pub target_peak: f64,
    pub arrangements: Vec<Arrangement>,
}

impl Score {
    pub fn new(name: impl Into<String>) -> Self {
        Score {
            name: name.into(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            duration: None,
            master_gain: default_master_gain(),
            target_peak: default_target_peak(),
            arrangements: Vec::new(),
        }
    }

    pub fn with_arrangement(mut self, arrangement: Arrangement) -> Self {
        self.arrangements.push(arrangement);
        self
    }

    pub fn from_json(json: &str) -> Result<Score> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a score from a JSON file.
    pub fn load(path: &Path) -> Result<Score> {
        let json = std::fs::read_to_string(path)?;
        Score::from_json(&json)
    }
}
