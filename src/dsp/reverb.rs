//! Reverb effect: a single delayed, attenuated copy mixed back in.
//!
//! The output is exactly as long as the input. Echoes that would land past
//! the end of the buffer are dropped rather than extending it.

use serde::{Deserialize, Serialize};

use super::buffer::SampleBuffer;
use crate::error::{Result, SynthError};
use crate::timing;

/// Reverb parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbConfig {
    /// Delay of the echo in seconds.
    pub delay: f64,
    /// Echo level relative to the dry signal (0.0 to 1.0).
    pub decay: f64,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        ReverbConfig {
            delay: 0.1,
            decay: 0.3,
        }
    }
}

impl ReverbConfig {
    pub fn apply(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        add_reverb(buffer, self.delay, self.decay)
    }
}

/// `out[i] = in[i] + decay * in[i - delay]` once `i` reaches the delay.
pub fn add_reverb(buffer: &SampleBuffer, delay_s: f64, decay: f64) -> Result<SampleBuffer> {
    if !delay_s.is_finite() || delay_s < 0.0 {
        return Err(SynthError::InvalidParameter {
            name: "reverb delay",
            value: delay_s,
        });
    }
    if !(0.0..=1.0).contains(&decay) {
        return Err(SynthError::InvalidParameter {
            name: "reverb decay",
            value: decay,
        });
    }
    let delay = timing::samples_for_span(delay_s, buffer.sample_rate)?;

    let mut out = buffer.data.clone();
    if decay != 0.0 {
        for i in delay..out.len() {
            out[i] += decay * buffer.data[i - delay];
        }
    }
    Ok(SampleBuffer::new(out, buffer.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(len: usize) -> SampleBuffer {
        let mut data = vec![0.0; len];
        data[0] = 1.0;
        SampleBuffer::new(data, 1000)
    }

    #[test]
    fn length_is_preserved() {
        let input = SampleBuffer::new(vec![0.25; 777], 44100);
        for delay in [0.0, 0.001, 0.1, 1.0, 5.0] {
            for decay in [0.0, 0.3, 1.0] {
                let out = add_reverb(&input, delay, decay).unwrap();
                assert_eq!(out.len(), input.len(), "delay={delay} decay={decay}");
            }
        }
    }

    #[test]
    fn zero_decay_is_passthrough() {
        let input = SampleBuffer::new(vec![0.1, -0.4, 0.9, 0.0, 0.3], 1000);
        let out = add_reverb(&input, 0.002, 0.0).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn echo_lands_at_delay() {
        let out = add_reverb(&impulse(200), 0.1, 0.3).unwrap();
        assert_eq!(out.data[0], 1.0);
        assert!((out.data[100] - 0.3).abs() < 1e-12);
        assert_eq!(out.data.iter().filter(|&&s| s != 0.0).count(), 2);
    }

    #[test]
    fn tail_past_end_is_dropped() {
        // delay longer than the buffer: nothing to add
        let out = add_reverb(&impulse(50), 0.1, 0.5).unwrap();
        assert_eq!(out, impulse(50));
    }

    #[test]
    fn echo_reads_dry_signal_only() {
        // a single tap, not a feedback loop
        let out = add_reverb(&impulse(300), 0.1, 0.5).unwrap();
        assert_eq!(out.data[200], 0.0);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let input = impulse(10);
        assert!(add_reverb(&input, -0.1, 0.3).is_err());
        assert!(add_reverb(&input, 0.1, 1.5).is_err());
        assert!(add_reverb(&input, f64::NAN, 0.3).is_err());
    }

    #[test]
    fn default_config() {
        let cfg = ReverbConfig::default();
        assert_eq!((cfg.delay, cfg.decay), (0.1, 0.3));
        let out = cfg.apply(&impulse(200)).unwrap();
        assert!((out.data[100] - 0.3).abs() < 1e-12);
    }
}
