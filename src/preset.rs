//! Built-in instruments and demo scores.
//!
//! Instruments are looked up by name from scores (`"instrument": "piano"`).
//! The demos are complete scores that double as worked examples of the
//! score format.

use crate::dsp::envelope::{Adsr, EnvelopeSpec};
use crate::dsp::oscillator::HarmonicProfile;
use crate::dsp::reverb::ReverbConfig;
use crate::error::{Result, SynthError};
use crate::note::Pitch;
use crate::score::{Arrangement, Entity, Instrument, Score};

// ── Instruments ─────────────────────────────────────────────

/// Names accepted by [`instrument`].
pub const INSTRUMENT_NAMES: [&str; 5] = ["piano", "sine_lead", "soft_chord", "warm_pad", "bass"];

/// Four fixed-weight harmonics with a short pluck-like envelope.
pub fn piano() -> Instrument {
    Instrument {
        harmonics: HarmonicProfile::Weights {
            weights: vec![1.0, 0.3, 0.15, 0.08],
        },
        envelope: Some(EnvelopeSpec::Seconds(Adsr::new(0.01, 0.05, 0.7, 0.1))),
        gain: 0.25,
        ..Instrument::default()
    }
}

/// A quiet sine, detached: each note sounds for 80% of its slot.
pub fn sine_lead() -> Instrument {
    Instrument {
        harmonics: HarmonicProfile::pure(0.2),
        envelope: Some(EnvelopeSpec::Fractions(Adsr::new(0.05, 0.1, 0.7, 0.3))),
        articulation: 0.8,
        ..Instrument::default()
    }
}

/// Sine chords with a gentle envelope and a short echo.
pub fn soft_chord() -> Instrument {
    Instrument {
        harmonics: HarmonicProfile::pure(0.3),
        envelope: Some(EnvelopeSpec::Fractions(Adsr::new(0.1, 0.1, 0.7, 0.2))),
        reverb: Some(ReverbConfig::default()),
        gain: 0.4,
        ..Instrument::default()
    }
}

/// Detuned harmonic pad with slow fades.
pub fn warm_pad() -> Instrument {
    Instrument {
        harmonics: HarmonicProfile::Falloff { base: 0.3, count: 4 },
        detune: vec![-2.0, 0.0, 2.0],
        envelope: Some(EnvelopeSpec::Seconds(Adsr::new(0.3, 0.0, 1.0, 0.3))),
        gain: 0.5,
        ..Instrument::default()
    }
}

/// Two harmonics, no envelope.
pub fn bass() -> Instrument {
    Instrument {
        harmonics: HarmonicProfile::Falloff { base: 0.3, count: 2 },
        gain: 0.3,
        ..Instrument::default()
    }
}

/// Look up a built-in instrument by name.
pub fn instrument(name: &str) -> Option<Instrument> {
    match name {
        "piano" => Some(piano()),
        "sine_lead" => Some(sine_lead()),
        "soft_chord" => Some(soft_chord()),
        "warm_pad" => Some(warm_pad()),
        "bass" => Some(bass()),
        _ => None,
    }
}

// ── Demo scores ─────────────────────────────────────────────

/// Names accepted by [`demo`].
pub const DEMO_NAMES: [&str; 3] = ["fur-elise", "ambient", "pad-progression"];

/// Look up a demo score by name.
pub fn demo(name: &str) -> Result<Score> {
    match name {
        "fur-elise" => Ok(fur_elise()),
        "ambient" => Ok(ambient()),
        "pad-progression" => Ok(pad_progression()),
        _ => Err(SynthError::UnknownDemo(name.to_string())),
    }
}

/// The opening of "Für Elise" on the piano instrument.
pub fn fur_elise() -> Score {
    let melody: [(&str, f64); 19] = [
        ("E5", 0.3),
        ("D5", 0.3),
        ("E5", 0.3),
        ("D5", 0.3),
        ("E5", 0.3),
        ("B4", 0.3),
        ("D5", 0.3),
        ("C5", 0.3),
        ("A4", 0.6),
        ("REST", 0.3),
        ("C4", 0.3),
        ("E4", 0.3),
        ("A4", 0.3),
        ("B4", 0.6),
        ("REST", 0.3),
        ("E4", 0.3),
        ("G4", 0.3),
        ("B4", 0.3),
        ("C5", 0.6),
    ];
    let line = melody
        .iter()
        .fold(Arrangement::new("melody", "piano"), |arr, &(note, d)| {
            arr.push(Entity::note(note), d)
        });
    Score::new("fur-elise").with_arrangement(line)
}

/// I–V–vi–IV pad with a repeating eight-note melody over each chord.
pub fn ambient() -> Score {
    const DURATION: f64 = 20.0;
    let progression: [[&str; 3]; 4] = [
        ["C3", "E3", "G3"],
        ["G3", "B4", "D4"],
        ["A3", "C4", "E4"],
        ["F4", "A4", "C5"],
    ];
    let motif = ["E5", "D5", "C5", "D5", "E5", "G5", "F5", "E5"];
    let chord_len = DURATION / progression.len() as f64;
    let note_len = chord_len / motif.len() as f64;

    let mut pad = Arrangement::new("pad", "soft_chord");
    let mut melody = Arrangement::new("melody", "sine_lead");
    for chord in progression {
        pad = pad.push(Entity::chord(chord), chord_len);
        for note in motif {
            melody = melody.push(Entity::note(note), note_len);
        }
    }

    let mut score = Score::new("ambient")
        .with_arrangement(pad)
        .with_arrangement(melody);
    score.duration = Some(DURATION);
    score.target_peak = 0.8;
    score
}

/// Five detuned pad chords over a bass line.
pub fn pad_progression() -> Score {
    const DURATION: f64 = 25.0;
    let progression: [[f64; 3]; 5] = [
        [261.63, 329.63, 392.00],
        [293.66, 369.99, 440.00],
        [220.00, 277.18, 329.63],
        [349.23, 440.00, 523.25],
        [392.00, 493.88, 587.33],
    ];
    let bass_line: [f64; 5] = [130.81, 146.83, 110.00, 174.61, 196.00];
    let chord_len = DURATION / progression.len() as f64;

    let mut pad = Arrangement::new("pad", "warm_pad");
    let mut low = Arrangement::new("bass", "bass");
    for (chord, root) in progression.iter().zip(bass_line) {
        pad = pad.push(Entity::chord(*chord), chord_len);
        low = low.push(Entity::Note(Pitch::Hz(root)), chord_len);
    }

    let mut score = Score::new("pad-progression")
        .with_arrangement(pad)
        .with_arrangement(low);
    score.duration = Some(DURATION);
    score
}
