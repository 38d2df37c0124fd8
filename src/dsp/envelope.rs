//! ADSR envelopes applied to finished buffers.
//!
//! Two ways of sizing the phases are supported:
//! - [`EnvelopeSpec::Seconds`]: attack/decay/release in seconds, release
//!   measured back from the end of the buffer.
//! - [`EnvelopeSpec::Fractions`]: attack/decay/release as fractions of the
//!   buffer length, sustain filling whatever is left.
//!
//! All ramps are linear and include both endpoints, so the first attack
//! sample is exactly 0 and the last release sample is exactly 0.

use serde::{Deserialize, Serialize};

use super::buffer::SampleBuffer;
use crate::error::{Result, SynthError};
use crate::timing;

/// Attack, decay, sustain level and release.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f64,
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    pub release: f64,
}

impl Adsr {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Adsr {
            attack,
            decay,
            sustain,
            release,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(SynthError::InvalidEnvelope(format!("{name} = {v}")));
            }
        }
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(SynthError::InvalidEnvelope(format!(
                "sustain = {} (must be within [0, 1])",
                self.sustain
            )));
        }
        Ok(())
    }
}

/// An envelope and the unit its phase lengths are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum EnvelopeSpec {
    Seconds(Adsr),
    Fractions(Adsr),
}

/// Phase lengths in samples. `attack + decay + release <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Phases {
    attack: usize,
    decay: usize,
    release: usize,
    total: usize,
}

impl Phases {
    fn sustain(&self) -> usize {
        self.total - self.attack - self.decay - self.release
    }

    /// Shrink all three phases by the same factor so they fit in `total`.
    ///
    /// A phase that was asked for keeps at least one sample while there is
    /// room, attack first, so a shortened note still starts from silence.
    fn fit(attack: usize, decay: usize, release: usize, total: usize) -> Phases {
        let sum = attack + decay + release;
        if sum <= total {
            return Phases {
                attack,
                decay,
                release,
                total,
            };
        }
        let scale = total as f64 / sum as f64;
        let shrink = |n: usize| (n as f64 * scale).floor() as usize;
        let (mut a, mut d, mut r) = (shrink(attack), shrink(decay), shrink(release));

        let mut spare = total - (a + d + r);
        for (wanted, got) in [(attack, &mut a), (release, &mut r), (decay, &mut d)] {
            if wanted > 0 && *got == 0 && spare > 0 {
                *got = 1;
                spare -= 1;
            }
        }
        // no room left: take the attack sample from the longer other phase
        if attack > 0 && a == 0 && total > 0 {
            if d >= r {
                d -= 1;
            } else {
                r -= 1;
            }
            a = 1;
        }
        Phases {
            attack: a,
            decay: d,
            release: r,
            total,
        }
    }

    fn from_seconds(adsr: &Adsr, total: usize, sample_rate: u32) -> Result<Phases> {
        let attack = timing::samples_for_span(adsr.attack, sample_rate)?;
        let decay = timing::samples_for_span(adsr.decay, sample_rate)?;
        let release = timing::samples_for_span(adsr.release, sample_rate)?;
        Ok(Phases::fit(attack, decay, release, total))
    }

    /// Boundaries are rounded cumulatively; sustain absorbs the remainder.
    fn from_fractions(adsr: &Adsr, total: usize) -> Phases {
        let (mut fa, mut fd, mut fr) = (adsr.attack, adsr.decay, adsr.release);
        let sum = fa + fd + fr;
        if sum > 1.0 {
            fa /= sum;
            fd /= sum;
            fr /= sum;
        }
        let len = total as f64;
        let mut attack_end = ((fa * len).round() as usize).min(total);
        if fa > 0.0 && attack_end == 0 && total > 0 {
            attack_end = 1;
        }
        let decay_end = (((fa + fd) * len).round() as usize).clamp(attack_end, total);
        let release_len = ((fr * len).round() as usize).min(total);
        let release_start = (total - release_len).max(decay_end);
        Phases {
            attack: attack_end,
            decay: decay_end - attack_end,
            release: total - release_start,
            total,
        }
    }

    fn gain_curve(&self, sustain: f64) -> Vec<f64> {
        let mut curve = Vec::with_capacity(self.total);
        curve.extend((0..self.attack).map(|j| ramp(0.0, 1.0, self.attack, j)));
        curve.extend((0..self.decay).map(|j| ramp(1.0, sustain, self.decay, j)));
        curve.extend(std::iter::repeat_n(sustain, self.sustain()));
        curve.extend((0..self.release).map(|j| ramp(sustain, 0.0, self.release, j)));
        curve
    }
}

/// Value `j` of a `len`-sample linear ramp from `from` to `to`, both ends
/// included.
fn ramp(from: f64, to: f64, len: usize, j: usize) -> f64 {
    if len <= 1 {
        return from;
    }
    let t = j as f64 / (len - 1) as f64;
    from * (1.0 - t) + to * t
}

/// The gain curve `spec` produces for a buffer of `len` samples.
pub fn gain_curve(spec: &EnvelopeSpec, len: usize, sample_rate: u32) -> Result<Vec<f64>> {
    let phases = match spec {
        EnvelopeSpec::Seconds(adsr) => {
            adsr.validate()?;
            Phases::from_seconds(adsr, len, sample_rate)?
        }
        EnvelopeSpec::Fractions(adsr) => {
            adsr.validate()?;
            Phases::from_fractions(adsr, len)
        }
    };
    let sustain = match spec {
        EnvelopeSpec::Seconds(adsr) | EnvelopeSpec::Fractions(adsr) => adsr.sustain,
    };
    Ok(phases.gain_curve(sustain))
}

/// Multiply `buffer` by the envelope, sample by sample.
pub fn apply_envelope(buffer: &SampleBuffer, spec: &EnvelopeSpec) -> Result<SampleBuffer> {
    let curve = gain_curve(spec, buffer.len(), buffer.sample_rate)?;
    let data = buffer
        .data
        .iter()
        .zip(&curve)
        .map(|(s, g)| s * g)
        .collect();
    Ok(SampleBuffer::new(data, buffer.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{HarmonicProfile, render_tone};

    fn ones(len: usize) -> SampleBuffer {
        SampleBuffer::new(vec![1.0; len], 44100)
    }

    #[test]
    fn seconds_phases_have_expected_shape() {
        let spec = EnvelopeSpec::Seconds(Adsr::new(0.01, 0.05, 0.7, 0.1));
        let out = apply_envelope(&ones(44100), &spec).unwrap();
        assert_eq!(out.len(), 44100);
        assert_eq!(out.data[0], 0.0, "attack starts at 0");
        assert!((out.data[440] - 1.0).abs() < 1e-12, "attack ends at 1");
        assert!((out.data[441 + 2204] - 0.7).abs() < 1e-12, "decay ends at sustain");
        assert!((out.data[20000] - 0.7).abs() < 1e-12, "sustain holds");
        assert!((out.data[44100 - 4410] - 0.7).abs() < 1e-12, "release starts at sustain");
        assert_eq!(out.data[44099], 0.0, "release ends at 0");
    }

    #[test]
    fn envelope_stays_in_unit_range() {
        for spec in [
            EnvelopeSpec::Seconds(Adsr::new(0.01, 0.05, 0.5, 0.1)),
            EnvelopeSpec::Fractions(Adsr::new(0.1, 0.1, 0.7, 0.2)),
        ] {
            let curve = gain_curve(&spec, 10_000, 44100).unwrap();
            assert!(curve.iter().all(|&g| (0.0..=1.0).contains(&g)), "{spec:?}");
        }
    }

    #[test]
    fn short_buffer_shrinks_phases() {
        // 0.16 s of phases squeezed into 0.05 s
        let adsr = Adsr::new(0.01, 0.05, 0.7, 0.1);
        let len = 2205;
        let phases = Phases::from_seconds(&adsr, len, 44100).unwrap();
        assert!(phases.attack + phases.decay + phases.release <= len);
        assert!(phases.release < len, "release window must not cover the whole buffer");
        assert!(phases.attack > 0 && phases.decay > 0);

        let out = apply_envelope(&ones(len), &EnvelopeSpec::Seconds(adsr)).unwrap();
        assert_eq!(out.len(), len);
        assert_eq!(out.data[0], 0.0);
        assert_eq!(out.data[len - 1], 0.0);
    }

    #[test]
    fn tiny_buffers_do_not_panic() {
        let spec = EnvelopeSpec::Seconds(Adsr::new(0.01, 0.05, 0.7, 0.1));
        for len in 0..5 {
            let out = apply_envelope(&ones(len), &spec).unwrap();
            assert_eq!(out.len(), len);
        }
    }

    #[test]
    fn short_notes_still_start_from_silence() {
        let specs = [
            EnvelopeSpec::Seconds(Adsr::new(0.01, 0.05, 0.7, 0.1)),
            EnvelopeSpec::Seconds(Adsr::new(0.001, 0.5, 0.7, 0.5)),
            EnvelopeSpec::Fractions(Adsr::new(0.05, 0.1, 0.7, 0.3)),
            EnvelopeSpec::Fractions(Adsr::new(0.01, 0.0, 1.0, 0.0)),
        ];
        for spec in specs {
            for len in 1..40 {
                let curve = gain_curve(&spec, len, 44100).unwrap();
                assert_eq!(curve.len(), len);
                assert_eq!(curve[0], 0.0, "{spec:?} len={len} starts at {}", curve[0]);
            }
        }
    }

    #[test]
    fn squeezed_phases_keep_one_sample_each() {
        let p = Phases::from_seconds(&Adsr::new(0.01, 0.05, 0.7, 0.1), 12, 44100).unwrap();
        assert!(p.attack >= 1 && p.decay >= 1 && p.release >= 1, "{p:?}");
        assert!(p.attack + p.decay + p.release <= 12);

        let p = Phases::from_seconds(&Adsr::new(0.01, 0.05, 0.7, 0.1), 2, 44100).unwrap();
        assert_eq!(p.attack, 1);
        assert!(p.attack + p.decay + p.release <= 2);
    }

    #[test]
    fn fraction_envelope_preserves_length() {
        let cases = [
            (0.1, 0.1, 0.2),
            (0.05, 0.1, 0.3),
            (0.25, 0.25, 0.5),
            (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0),
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (0.0, 0.0, 1.0),
        ];
        for len in [0, 1, 2, 3, 7, 10, 99, 1001, 44100] {
            for &(a, d, r) in &cases {
                let spec = EnvelopeSpec::Fractions(Adsr::new(a, d, 0.7, r));
                let out = apply_envelope(&ones(len), &spec).unwrap();
                assert_eq!(out.len(), len, "len={len} a={a} d={d} r={r}");
            }
        }
    }

    #[test]
    fn fraction_boundary_sum_of_one_has_no_sustain() {
        let adsr = Adsr::new(0.25, 0.25, 0.7, 0.5);
        let phases = Phases::from_fractions(&adsr, 10);
        assert_eq!(phases.sustain(), 0);
        assert_eq!(phases.attack + phases.decay + phases.release, 10);
    }

    #[test]
    fn fractions_over_one_are_shrunk() {
        let spec = EnvelopeSpec::Fractions(Adsr::new(0.6, 0.6, 0.5, 0.6));
        let out = apply_envelope(&ones(300), &spec).unwrap();
        assert_eq!(out.len(), 300);
        assert_eq!(out.data[0], 0.0);
        assert_eq!(out.data[299], 0.0);
    }

    #[test]
    fn fraction_segments_match_reference_split() {
        // attack 0.1, decay 0.1, release 0.2 of 1000 samples
        let adsr = Adsr::new(0.1, 0.1, 0.7, 0.2);
        let p = Phases::from_fractions(&adsr, 1000);
        assert_eq!((p.attack, p.decay, p.sustain(), p.release), (100, 100, 600, 200));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let bad = [
            Adsr::new(-0.1, 0.1, 0.5, 0.1),
            Adsr::new(0.1, f64::NAN, 0.5, 0.1),
            Adsr::new(0.1, 0.1, 1.5, 0.1),
        ];
        for adsr in bad {
            assert!(matches!(
                apply_envelope(&ones(10), &EnvelopeSpec::Seconds(adsr)),
                Err(SynthError::InvalidEnvelope(_))
            ));
        }
    }

    #[test]
    fn single_a4_note_scenario() {
        let tone = render_tone(440.0, 1.0, 44100, &HarmonicProfile::pure(0.3)).unwrap();
        let spec = EnvelopeSpec::Seconds(Adsr::new(0.01, 0.05, 0.7, 0.1));
        let out = apply_envelope(&tone, &spec).unwrap();
        assert_eq!(out.len(), 44100);
        assert_eq!(out.data[0], 0.0);
        // sustain region: 0.06 s .. 0.9 s
        for i in 2700..39000 {
            assert!(
                out.data[i].abs() <= 0.3 * 0.7 + 1e-9,
                "sample {i} = {} exceeds sustain bound",
                out.data[i]
            );
        }
    }

    #[test]
    fn spec_json_shape() {
        let spec: EnvelopeSpec = serde_json::from_str(
            r#"{"unit":"fractions","attack":0.1,"decay":0.1,"sustain":0.7,"release":0.2}"#,
        )
        .unwrap();
        assert_eq!(spec, EnvelopeSpec::Fractions(Adsr::new(0.1, 0.1, 0.7, 0.2)));
    }
}
