//! Mono sample buffers.

use crate::error::Result;
use crate::timing;

/// A mono buffer of f64 samples at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub data: Vec<f64>,
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(data: Vec<f64>, sample_rate: u32) -> Self {
        SampleBuffer { data, sample_rate }
    }

    /// A buffer of `len` zero samples.
    pub fn silence(len: usize, sample_rate: u32) -> Self {
        SampleBuffer {
            data: vec![0.0; len],
            sample_rate,
        }
    }

    /// A zero buffer covering `duration_s`, validated like every other render.
    pub fn silence_for(duration_s: f64, sample_rate: u32) -> Result<Self> {
        let len = timing::samples_for(duration_s, sample_rate)?;
        Ok(Self::silence(len, sample_rate))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value; 0 for an empty buffer.
    pub fn peak(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |m, &s| m.max(s.abs()))
    }

    /// True if every sample is exactly zero.
    pub fn is_silent(&self) -> bool {
        self.data.iter().all(|&s| s == 0.0)
    }

    /// Multiply every sample by `gain`.
    pub fn scaled(mut self, gain: f64) -> Self {
        if gain != 1.0 {
            for s in &mut self.data {
                *s *= gain;
            }
        }
        self
    }

    pub fn as_f32(&self) -> Vec<f32> {
        self.data.iter().map(|&s| s as f32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_exact_length() {
        let b = SampleBuffer::silence_for(0.5, 44100).unwrap();
        assert_eq!(b.len(), 22050);
        assert!(b.is_silent());
        assert_eq!(b.peak(), 0.0);
    }

    #[test]
    fn silence_for_rejects_bad_duration() {
        assert!(SampleBuffer::silence_for(-1.0, 44100).is_err());
    }

    #[test]
    fn peak_uses_absolute_value() {
        let b = SampleBuffer::new(vec![0.1, -0.7, 0.5], 8000);
        assert!((b.peak() - 0.7).abs() < 1e-12);
    }
}
