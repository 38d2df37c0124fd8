//! Arrangement sequencer: lays entries out on a timeline and renders them.
//!
//! Start offsets come from the accumulated start time of each entry, rounded
//! once, so per-note rounding never drifts. Each entry is rendered on its
//! own and added into a zeroed destination; the sounding part of an entry
//! may be shorter than its slot (articulation) and is clipped at the end of
//! the destination.

use serde::Serialize;
use tracing::{debug, info};

use super::buffer::SampleBuffer;
use super::envelope::apply_envelope;
use super::mixer::{Mixer, render_chord};
use super::normalize::{normalize, quantize_16bit};
use crate::error::{Result, SynthError};
use crate::score::{Arrangement, Entity, Instrument, Score};
use crate::timing::{self, check_duration, check_sample_rate, round_samples};

/// Where one entry lands in its arrangement's buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub arrangement: String,
    pub index: usize,
    /// First sample of the slot.
    pub start: usize,
    /// First sample of the next slot.
    pub slot_end: usize,
    /// One past the last sounding sample, clamped to the buffer length.
    pub end: usize,
}

impl Placement {
    pub fn sounding_len(&self) -> usize {
        self.end - self.start
    }
}

/// Total length and per-entry placements of an arrangement.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub total: usize,
    pub placements: Vec<Placement>,
}

/// Compute where every entry of `arrangement` goes.
pub fn layout(arrangement: &Arrangement, instrument: &Instrument, sample_rate: u32) -> Result<Layout> {
    check_sample_rate(sample_rate)?;
    if arrangement.entries.is_empty() {
        return Err(SynthError::EmptyArrangement(arrangement.name.clone()));
    }
    for entry in &arrangement.entries {
        check_duration(entry.duration)?;
    }
    let total = match arrangement.length {
        Some(length) => timing::samples_for(length, sample_rate)?,
        None => timing::samples_for(arrangement.natural_length(), sample_rate)?,
    };

    let mut placements = Vec::with_capacity(arrangement.entries.len());
    let mut t = 0.0;
    for (index, entry) in arrangement.entries.iter().enumerate() {
        let start = round_samples(t, sample_rate).min(total);
        t += entry.duration;
        let slot_end = round_samples(t, sample_rate).min(total);
        let sounding = timing::samples_for(entry.duration * instrument.articulation, sample_rate)?;
        let end = (start + sounding).min(total);
        placements.push(Placement {
            arrangement: arrangement.name.clone(),
            index,
            start,
            slot_end,
            end,
        });
    }
    Ok(Layout { total, placements })
}

/// Render one entity for `duration_s` seconds with `instrument`.
///
/// Voices carry the instrument's gain and are averaged first; envelope and
/// reverb then shape the mix. Rest pitches inside a chord are left out of
/// the average, and an entity with nothing to sound renders silence.
pub fn render_entity(
    entity: &Entity,
    duration_s: f64,
    sample_rate: u32,
    instrument: &Instrument,
) -> Result<SampleBuffer> {
    if matches!(entity, Entity::Chord(pitches) if pitches.is_empty()) {
        return Err(SynthError::NoVoices);
    }
    let pitched: Vec<f64> = entity
        .frequencies()?
        .into_iter()
        .filter(|&f| f > 0.0)
        .collect();
    if pitched.is_empty() {
        return SampleBuffer::silence_for(duration_s, sample_rate);
    }

    let mut buffer = render_chord(&instrument.voices(&pitched), duration_s, sample_rate)?;
    if let Some(envelope) = &instrument.envelope {
        buffer = apply_envelope(&buffer, envelope)?;
    }
    if let Some(reverb) = &instrument.reverb {
        buffer = reverb.apply(&buffer)?;
    }
    Ok(buffer)
}

/// Render a whole arrangement into one buffer.
pub fn render_arrangement(arrangement: &Arrangement, sample_rate: u32) -> Result<SampleBuffer> {
    let instrument = arrangement.instrument.resolve()?;
    let Layout { total, placements } = layout(arrangement, &instrument, sample_rate)?;

    let mut mixer = Mixer::new(sample_rate);
    mixer.clear(total);
    for (entry, placement) in arrangement.entries.iter().zip(&placements) {
        if placement.sounding_len() == 0 {
            continue;
        }
        let rendered = render_entity(
            &entry.entity,
            entry.duration * instrument.articulation,
            sample_rate,
            &instrument,
        )?;
        let len = placement.sounding_len().min(rendered.len());
        mixer.overlay(placement.start, &rendered.data[..len]);
    }

    debug!(
        arrangement = %arrangement.name,
        entries = placements.len(),
        samples = total,
        "arrangement rendered"
    );
    Ok(mixer.output())
}

/// Placements of every arrangement of `score`, in arrangement order.
pub fn score_timeline(score: &Score) -> Result<Vec<Placement>> {
    let mut all = Vec::new();
    for arrangement in &score.arrangements {
        let instrument = arrangement.instrument.resolve()?;
        all.extend(layout(arrangement, &instrument, score.sample_rate)?.placements);
    }
    Ok(all)
}

/// Render every arrangement, sum them, normalize and apply master gain.
///
/// The result is `score.duration` long when set, otherwise as long as the
/// longest arrangement; shorter arrangements are followed by silence. The
/// peak of the result is `target_peak × master_gain`. Any error in any
/// arrangement aborts the score.
pub fn render_score(score: &Score) -> Result<SampleBuffer> {
    check_sample_rate(score.sample_rate)?;
    if score.arrangements.is_empty() {
        return Err(SynthError::EmptyScore(score.name.clone()));
    }
    if !(score.master_gain > 0.0 && score.master_gain <= 1.0) {
        return Err(SynthError::InvalidParameter {
            name: "master gain",
            value: score.master_gain,
        });
    }

    let lines = score
        .arrangements
        .iter()
        .map(|a| render_arrangement(a, score.sample_rate))
        .collect::<Result<Vec<_>>>()?;

    let total = match score.duration {
        Some(d) => timing::samples_for(d, score.sample_rate)?,
        None => lines.iter().map(SampleBuffer::len).max().unwrap_or(0),
    };

    let mut mixer = Mixer::new(score.sample_rate);
    mixer.clear(total);
    for line in &lines {
        mixer.overlay(0, &line.data);
    }
    let out = normalize(&mixer.output(), score.target_peak)?.scaled(score.master_gain);

    info!(
        score = %score.name,
        arrangements = lines.len(),
        samples = out.len(),
        seconds = out.duration(),
        "score rendered"
    );
    Ok(out)
}

/// Render a score straight to 16-bit samples.
pub fn render_score_pcm(score: &Score) -> Result<Vec<i16>> {
    Ok(quantize_16bit(&render_score(score)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::{Adsr, EnvelopeSpec};
    use crate::dsp::oscillator::HarmonicProfile;

    fn quarter_notes(articulation: f64) -> Arrangement {
        let instrument = Instrument {
            articulation,
            ..Instrument::default()
        };
        Arrangement::new("quarters", instrument)
            .push(Entity::note("C4"), 0.3)
            .push(Entity::note("E4"), 0.3)
            .push(Entity::note("G4"), 0.3)
            .push(Entity::note("C5"), 0.3)
    }

    #[test]
    fn contiguous_slots_cover_the_arrangement() {
        let arr = quarter_notes(1.0);
        let inst = arr.instrument.resolve().unwrap();
        let Layout { total, placements } = layout(&arr, &inst, 44100).unwrap();

        let expected = 13230 * 4;
        assert!(total.abs_diff(expected) <= 4, "total {total}");
        assert_eq!(placements[0].start, 0);
        for pair in placements.windows(2) {
            assert_eq!(pair[0].slot_end, pair[1].start, "slots must be contiguous");
            assert!(pair[0].start < pair[1].start, "slots must not share a start");
            assert!(pair[0].end <= pair[1].start, "full-length notes must not overlap");
        }
        assert_eq!(placements.last().unwrap().end, total);

        let rendered = render_arrangement(&arr, 44100).unwrap();
        assert_eq!(rendered.len(), total);
    }

    #[test]
    fn articulation_leaves_a_gap() {
        let arr = quarter_notes(0.8);
        let inst = arr.instrument.resolve().unwrap();
        let lay = layout(&arr, &inst, 44100).unwrap();
        let p = &lay.placements[0];
        assert_eq!(p.sounding_len(), 10584);

        let rendered = render_arrangement(&arr, 44100).unwrap();
        assert!(
            rendered.data[p.end..p.slot_end].iter().all(|&s| s == 0.0),
            "gap after a short note must be silent"
        );
    }

    #[test]
    fn last_note_is_clamped_to_length() {
        let arr = quarter_notes(1.0).with_length(1.0);
        let rendered = render_arrangement(&arr, 44100).unwrap();
        assert_eq!(rendered.len(), 44100);

        let inst = arr.instrument.resolve().unwrap();
        let lay = layout(&arr, &inst, 44100).unwrap();
        assert_eq!(lay.placements[3].end, 44100);
    }

    #[test]
    fn rests_render_silence() {
        let arr = Arrangement::new("rests", Instrument::default())
            .push(Entity::Rest, 0.2)
            .push(Entity::note("A4"), 0.2)
            .push(Entity::note("REST"), 0.2);
        let out = render_arrangement(&arr, 8000).unwrap();
        assert_eq!(out.len(), 4800);
        assert!(out.data[..1600].iter().all(|&s| s == 0.0));
        assert!(out.data[1600..3200].iter().any(|&s| s != 0.0));
        assert!(out.data[3200..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn unknown_note_aborts_the_score() {
        let score = Score::new("broken")
            .with_arrangement(quarter_notes(1.0))
            .with_arrangement(
                Arrangement::new("bad", Instrument::default()).push(Entity::note("Q7"), 0.5),
            );
        assert!(matches!(render_score(&score), Err(SynthError::UnknownNote(_))));
    }

    #[test]
    fn invalid_duration_aborts_the_score() {
        let score = Score::new("broken").with_arrangement(
            Arrangement::new("bad", Instrument::default()).push(Entity::note("C4"), -0.5),
        );
        assert!(matches!(render_score(&score), Err(SynthError::InvalidDuration(_))));
    }

    #[test]
    fn empty_inputs_are_errors() {
        assert!(matches!(
            render_score(&Score::new("nothing")),
            Err(SynthError::EmptyScore(_))
        ));
        let score = Score::new("x").with_arrangement(Arrangement::new("empty", Instrument::default()));
        assert!(matches!(render_score(&score), Err(SynthError::EmptyArrangement(_))));
        assert!(matches!(
            render_entity(&Entity::Chord(vec![]), 0.1, 44100, &Instrument::default()),
            Err(SynthError::NoVoices)
        ));
    }

    #[test]
    fn chord_scenario_normalizes_to_target() {
        let mut score = Score::new("chord").with_arrangement(
            Arrangement::new("pad", Instrument::default())
                .push(Entity::chord([261.63, 329.63, 392.00]), 2.0),
        );
        score.target_peak = 0.85;
        let out = render_score(&score).unwrap();
        assert_eq!(out.len(), 88200);
        assert!((out.peak() - 0.85).abs() < 1e-6, "peak {}", out.peak());
    }

    #[test]
    fn score_length_follows_longest_or_explicit_duration() {
        let short = Arrangement::new("short", Instrument::default()).push(Entity::note("C4"), 0.5);
        let long = Arrangement::new("long", Instrument::default()).push(Entity::note("E4"), 1.0);
        let mut score = Score::new("two")
            .with_arrangement(short)
            .with_arrangement(long);
        score.sample_rate = 8000;
        assert_eq!(render_score(&score).unwrap().len(), 8000);

        score.duration = Some(0.75);
        assert_eq!(render_score(&score).unwrap().len(), 6000);
    }

    #[test]
    fn entity_pipeline_applies_envelope_and_gain() {
        let instrument = Instrument {
            harmonics: HarmonicProfile::pure(1.0),
            envelope: Some(EnvelopeSpec::Fractions(Adsr::new(0.1, 0.1, 0.5, 0.2))),
            gain: 0.5,
            ..Instrument::default()
        };
        let out = render_entity(&Entity::note("A4"), 0.5, 44100, &instrument).unwrap();
        assert_eq!(out.len(), 22050);
        assert_eq!(out.data[0], 0.0);
        assert_eq!(*out.data.last().unwrap(), 0.0);
        assert!(out.peak() <= 0.5 + 1e-9);
    }

    #[test]
    fn detuned_note_stays_bounded() {
        let instrument = Instrument {
            harmonics: HarmonicProfile::pure(0.3),
            detune: vec![-2.0, 0.0, 2.0],
            ..Instrument::default()
        };
        let out = render_entity(&Entity::note("C4"), 1.0, 44100, &instrument).unwrap();
        assert_eq!(out.len(), 44100);
        assert!(out.peak() <= 0.3 + 1e-9, "averaging keeps the chorus at voice level");
    }

    #[test]
    fn master_gain_scales_the_normalized_peak() {
        let line = Arrangement::new("a", Instrument::default()).push(Entity::note("A4"), 0.25);
        let mut score = Score::new("gain").with_arrangement(line);
        score.sample_rate = 8000;
        let full = render_score(&score).unwrap();

        score.master_gain = 0.1;
        let quiet = render_score(&score).unwrap();
        assert!((full.peak() - 0.85).abs() < 1e-9);
        assert!((quiet.peak() - 0.085).abs() < 1e-9, "peak {}", quiet.peak());
        assert_ne!(render_score_pcm(&score).unwrap(), quantize_16bit(&full));

        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            score.master_gain = bad;
            assert!(
                matches!(render_score(&score), Err(SynthError::InvalidParameter { .. })),
                "master gain {bad} should be rejected"
            );
        }
    }

    #[test]
    fn rests_inside_a_chord_do_not_dilute_it() {
        let instrument = Instrument {
            harmonics: HarmonicProfile::pure(0.3),
            ..Instrument::default()
        };
        let with_rest = render_entity(&Entity::chord(["C4", "REST"]), 0.1, 44100, &instrument).unwrap();
        let alone = render_entity(&Entity::note("C4"), 0.1, 44100, &instrument).unwrap();
        assert_eq!(with_rest, alone);

        let all_rests = render_entity(&Entity::chord(["R", "-"]), 0.1, 44100, &instrument).unwrap();
        assert_eq!(all_rests.len(), 4410);
        assert!(all_rests.is_silent());
    }

    #[test]
    fn rendering_is_deterministic() {
        let score = Score::new("repeat").with_arrangement(quarter_notes(0.8));
        assert_eq!(render_score_pcm(&score).unwrap(), render_score_pcm(&score).unwrap());
    }

    #[test]
    fn timeline_lists_every_entry() {
        let score = Score::new("t")
            .with_arrangement(quarter_notes(1.0))
            .with_arrangement(
                Arrangement::new("bass", Instrument::default()).push(Entity::note("C3"), 1.2),
            );
        let timeline = score_timeline(&score).unwrap();
        assert_eq!(timeline.len(), 5);
        assert_eq!(timeline[4].arrangement, "bass");
        assert_eq!(timeline[4].start, 0);
    }
}
