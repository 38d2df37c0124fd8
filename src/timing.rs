//! Duration to sample-count conversion.
//!
//! Every place that turns seconds into samples goes through this module so
//! voices covering the same time slot always agree on their length. The
//! policy is round-half-up: `round(duration × sample_rate)`.

use crate::error::{Result, SynthError};

/// Reference sample rate used by the demos and the CLI.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Reject a zero sample rate before anything is allocated.
pub fn check_sample_rate(sample_rate: u32) -> Result<()> {
    if sample_rate == 0 {
        return Err(SynthError::InvalidSampleRate(sample_rate));
    }
    Ok(())
}

/// Reject non-finite and non-positive durations.
pub fn check_duration(duration_s: f64) -> Result<()> {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return Err(SynthError::InvalidDuration(duration_s));
    }
    Ok(())
}

/// Number of samples covering `duration_s` seconds.
pub fn samples_for(duration_s: f64, sample_rate: u32) -> Result<usize> {
    check_duration(duration_s)?;
    check_sample_rate(sample_rate)?;
    Ok(round_samples(duration_s, sample_rate))
}

/// Like [`samples_for`] but a zero duration is allowed (and yields zero).
///
/// Used for envelope phases and delay times, where "no time" is a valid
/// setting rather than a malformed note.
pub fn samples_for_span(duration_s: f64, sample_rate: u32) -> Result<usize> {
    if duration_s == 0.0 {
        return Ok(0);
    }
    samples_for(duration_s, sample_rate)
}

/// Sample index of a point in time, with no validation.
///
/// Callers only pass accumulated, already-validated start times.
pub(crate) fn round_samples(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).round() as usize
}
