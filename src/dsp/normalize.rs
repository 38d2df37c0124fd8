//! Peak normalization and 16-bit quantization.

use super::buffer::SampleBuffer;
use crate::error::{Result, SynthError};

/// Scale `buffer` so its largest absolute sample equals `target_peak`.
///
/// An all-zero buffer is returned unchanged.
pub fn normalize(buffer: &SampleBuffer, target_peak: f64) -> Result<SampleBuffer> {
    if !(target_peak > 0.0 && target_peak <= 1.0) {
        return Err(SynthError::InvalidParameter {
            name: "target peak",
            value: target_peak,
        });
    }
    let peak = buffer.peak();
    if !peak.is_finite() {
        return Err(SynthError::InvalidParameter {
            name: "buffer peak",
            value: peak,
        });
    }
    if buffer.is_silent() {
        return Ok(buffer.clone());
    }
    Ok(buffer.clone().scaled(target_peak / peak))
}

/// Map samples in [-1, 1] to i16 via `round(s * 32767)`, clamped to the i16
/// range. NaN becomes 0.
pub fn quantize_16bit(buffer: &SampleBuffer) -> Vec<i16> {
    buffer.data.iter().map(|&s| quantize_sample(s)).collect()
}

#[inline]
fn quantize_sample(s: f64) -> i16 {
    (s * 32767.0).round().clamp(-32768.0, 32767.0) as i16
}
