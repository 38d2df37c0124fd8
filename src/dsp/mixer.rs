//! Mixer: averages simultaneous voices and accumulates placed buffers.

use super::buffer::SampleBuffer;
use super::oscillator::Voice;
use crate::error::{Result, SynthError};

/// Average equal-length voices into one buffer.
///
/// Voices are summed in the order given, then divided by the voice count,
/// so adding voices never raises the level. Voices must agree on length and
/// sample rate; a mismatch is reported rather than trimmed.
pub fn mix_voices(voices: &[SampleBuffer]) -> Result<SampleBuffer> {
    let first = voices.first().ok_or(SynthError::NoVoices)?;
    let len = first.len();
    for v in &voices[1..] {
        if v.len() != len {
            return Err(SynthError::VoiceLengthMismatch {
                expected: len,
                found: v.len(),
            });
        }
        if v.sample_rate != first.sample_rate {
            return Err(SynthError::InvalidSampleRate(v.sample_rate));
        }
    }

    let mut sum = vec![0.0_f64; len];
    for v in voices {
        for (acc, &s) in sum.iter_mut().zip(&v.data) {
            *acc += s;
        }
    }
    let n = voices.len() as f64;
    for s in &mut sum {
        *s /= n;
    }
    Ok(SampleBuffer::new(sum, first.sample_rate))
}

/// Render every voice for `duration_s` seconds and average them.
///
/// All voices come from the same nominal duration so their lengths match.
/// Each voice's gain weights it within the mean.
pub fn render_chord(voices: &[Voice], duration_s: f64, sample_rate: u32) -> Result<SampleBuffer> {
    let rendered = voices
        .iter()
        .map(|v| v.render(duration_s, sample_rate))
        .collect::<Result<Vec<_>>>()?;
    mix_voices(&rendered)
}

/// A summing mixer that accumulates buffers placed at sample offsets.
#[derive(Debug, Clone)]
pub struct Mixer {
    buffer: Vec<f64>,
    sample_rate: u32,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        Mixer {
            buffer: Vec::new(),
            sample_rate,
        }
    }

    /// Prepare a buffer of `num_samples` filled with zeros.
    pub fn clear(&mut self, num_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
    }

    /// Add `source` starting at `offset`. Samples past the end are dropped.
    /// Returns the number of samples actually written.
    pub fn overlay(&mut self, offset: usize, source: &[f64]) -> usize {
        if offset >= self.buffer.len() {
            return 0;
        }
        let end = (offset + source.len()).min(self.buffer.len());
        for (dst, &s) in self.buffer[offset..end].iter_mut().zip(source) {
            *dst += s;
        }
        end - offset
    }

    pub fn output(&self) -> SampleBuffer {
        SampleBuffer::new(self.buffer.clone(), self.sample_rate)
    }
}
