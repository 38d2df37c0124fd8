//! Render settings that sit outside a score: overrides, output path and
//! playback. The CLI fills one from its flags; library callers can build or
//! deserialize one directly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};
use crate::playback::PlaybackMode;
use crate::score::Score;
use crate::timing::check_sample_rate;

pub const DEFAULT_OUTPUT: &str = "tonewright.wav";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Replaces the score's sample rate.
    pub sample_rate: Option<u32>,
    /// Replaces the score's normalization target.
    pub target_peak: Option<f64>,
    pub output: PathBuf,
    pub playback: PlaybackMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            sample_rate: None,
            target_peak: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            playback: PlaybackMode::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_json(json: &str) -> Result<RenderConfig> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the overrides on their own, before any score is involved.
    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.sample_rate {
            check_sample_rate(rate)?;
        }
        if let Some(peak) = self.target_peak
            && !(peak > 0.0 && peak <= 1.0)
        {
            return Err(SynthError::InvalidParameter {
                name: "target peak",
                value: peak,
            });
        }
        Ok(())
    }

    /// A copy of `score` with the overrides applied.
    pub fn apply(&self, score: &Score) -> Score {
        let mut score = score.clone();
        if let Some(rate) = self.sample_rate {
            score.sample_rate = rate;
        }
        if let Some(peak) = self.target_peak {
            score.target_peak = peak;
        }
        score
    }
}
