//! Error types for synthesis, rendering and file output.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    /// Durations must be finite and strictly positive.
    #[error("Invalid duration: {0} s")]
    InvalidDuration(f64),
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),
    #[error("Invalid frequency: {0} Hz")]
    InvalidFrequency(f64),
    /// A note name that is neither in the pitch table nor a rest marker.
    #[error("Unknown note '{0}'")]
    UnknownNote(String),
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("No voices to mix")]
    NoVoices,
    /// Voices mixed together must share length and sample rate.
    #[error("Voice length mismatch: expected {expected} samples, found {found}")]
    VoiceLengthMismatch { expected: usize, found: usize },
    #[error("Arrangement '{0}' has no entries")]
    EmptyArrangement(String),
    #[error("Score '{0}' has no arrangements")]
    EmptyScore(String),
    #[error("Unknown instrument preset '{0}'")]
    UnknownInstrument(String),
    #[error("Unknown demo '{0}'")]
    UnknownDemo(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Score JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SynthError>;

impl SynthError {
    /// True for errors raised while turning a score into samples, as
    /// opposed to file or parse failures around it.
    pub fn is_synthesis(&self) -> bool {
        !matches!(
            self,
            SynthError::Io(_) | SynthError::Wav(_) | SynthError::Json(_) | SynthError::UnknownDemo(_)
        )
    }
}
