//! Additive sine oscillators.
//!
//! A tone is a stack of harmonics of one fundamental; each harmonic `k` is a
//! sine at `k × f` with an amplitude taken from a [`HarmonicProfile`]. The
//! waveform is evaluated directly at `t = i / sample_rate`, so renders of the
//! same frequency are sample-identical no matter where they are placed.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::buffer::SampleBuffer;
use crate::error::{Result, SynthError};
use crate::timing;

/// How loud each harmonic is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HarmonicProfile {
    /// `count` harmonics, harmonic `k` at `base / k`.
    Falloff { base: f64, count: u32 },
    /// One explicit amplitude per harmonic, fundamental first.
    Weights { weights: Vec<f64> },
}

impl Default for HarmonicProfile {
    fn default() -> Self {
        HarmonicProfile::Falloff {
            base: 0.3,
            count: 1,
        }
    }
}

impl HarmonicProfile {
    /// A bare sine at the given amplitude.
    pub fn pure(amplitude: f64) -> Self {
        HarmonicProfile::Falloff {
            base: amplitude,
            count: 1,
        }
    }

    /// Number of harmonics, fundamental included.
    pub fn count(&self) -> usize {
        match self {
            HarmonicProfile::Falloff { count, .. } => *count as usize,
            HarmonicProfile::Weights { weights } => weights.len(),
        }
    }

    /// Amplitude of harmonic `k` (1-based); 0 past the last harmonic.
    pub fn amplitude(&self, k: usize) -> f64 {
        match self {
            HarmonicProfile::Falloff { base, count } => {
                if k == 0 || k > *count as usize {
                    0.0
                } else {
                    base / k as f64
                }
            }
            HarmonicProfile::Weights { weights } => {
                if k == 0 {
                    0.0
                } else {
                    weights.get(k - 1).copied().unwrap_or(0.0)
                }
            }
        }
    }

    /// Sum of absolute harmonic amplitudes: an upper bound on the tone's peak.
    pub fn max_amplitude(&self) -> f64 {
        (1..=self.count()).map(|k| self.amplitude(k).abs()).sum()
    }

    fn validate(&self) -> Result<()> {
        if self.count() == 0 {
            return Err(SynthError::InvalidParameter {
                name: "harmonics",
                value: 0.0,
            });
        }
        for k in 1..=self.count() {
            let a = self.amplitude(k);
            if !a.is_finite() {
                return Err(SynthError::InvalidParameter {
                    name: "harmonic amplitude",
                    value: a,
                });
            }
        }
        Ok(())
    }
}

/// Render `duration_s` seconds of a harmonic tone.
///
/// A frequency of 0 yields silence of the same length as any other render
/// of that duration; the oscillator is not evaluated at all.
pub fn render_tone(
    frequency_hz: f64,
    duration_s: f64,
    sample_rate: u32,
    harmonics: &HarmonicProfile,
) -> Result<SampleBuffer> {
    render_detuned(frequency_hz, 0.0, duration_s, sample_rate, harmonics)
}

/// Render a tone whose fundamental is shifted by `detune_hz` before the
/// harmonics are stacked. Detuned copies are independent renders.
pub fn render_detuned(
    frequency_hz: f64,
    detune_hz: f64,
    duration_s: f64,
    sample_rate: u32,
    harmonics: &HarmonicProfile,
) -> Result<SampleBuffer> {
    let len = timing::samples_for(duration_s, sample_rate)?;
    if !frequency_hz.is_finite() || frequency_hz < 0.0 {
        return Err(SynthError::InvalidFrequency(frequency_hz));
    }
    if frequency_hz == 0.0 {
        return Ok(SampleBuffer::silence(len, sample_rate));
    }

    let freq = frequency_hz + detune_hz;
    if !freq.is_finite() || freq < 0.0 {
        return Err(SynthError::InvalidFrequency(freq));
    }
    harmonics.validate()?;

    let amps: Vec<f64> = (1..=harmonics.count()).map(|k| harmonics.amplitude(k)).collect();
    let sr = sample_rate as f64;
    let data = (0..len)
        .map(|i| {
            let w = 2.0 * PI * freq * (i as f64 / sr);
            amps.iter()
                .enumerate()
                .map(|(n, a)| a * (w * (n + 1) as f64).sin())
                .sum::<f64>()
        })
        .collect();
    Ok(SampleBuffer::new(data, sample_rate))
}

/// A single oscillator instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub frequency: f64,
    pub harmonics: HarmonicProfile,
    /// Offset in Hz added to the fundamental.
    pub detune_hz: f64,
    pub gain: f64,
}

impl Voice {
    pub fn new(frequency: f64) -> Self {
        Voice {
            frequency,
            harmonics: HarmonicProfile::default(),
            detune_hz: 0.0,
            gain: 1.0,
        }
    }

    pub fn with_harmonics(mut self, harmonics: HarmonicProfile) -> Self {
        self.harmonics = harmonics;
        self
    }

    pub fn with_detune(mut self, detune_hz: f64) -> Self {
        self.detune_hz = detune_hz;
        self
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn render(&self, duration_s: f64, sample_rate: u32) -> Result<SampleBuffer> {
        let tone = render_detuned(
            self.frequency,
            self.detune_hz,
            duration_s,
            sample_rate,
            &self.harmonics,
        )?;
        Ok(tone.scaled(self.gain))
    }
}
