pub mod config;
pub mod dsp;
pub mod error;
pub mod note;
pub mod playback;
pub mod preset;
pub mod score;
pub mod timing;
pub mod wav;

use std::path::{Path, PathBuf};

use tracing::info;
use wasm_bindgen::prelude::*;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::playback::PlaybackOutcome;
use crate::score::Score;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the tonewright version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-exposed: render a JSON score to a WAV byte array.
#[wasm_bindgen]
pub fn render_score_wav(score_json: &str) -> std::result::Result<Vec<u8>, JsValue> {
    let score = Score::from_json(score_json).map_err(js_error)?;
    wav::render_wav(&score).map_err(js_error)
}

/// WASM-exposed: render a JSON score to normalized mono f32 samples.
/// Returns the raw audio buffer for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_score_samples(score_json: &str) -> std::result::Result<Vec<f32>, JsValue> {
    let score = Score::from_json(score_json).map_err(js_error)?;
    let buffer = dsp::sequencer::render_score(&score).map_err(js_error)?;
    Ok(buffer.as_f32())
}

/// WASM-exposed: where every entry of a JSON score lands, in samples.
#[wasm_bindgen]
pub fn score_timeline(score_json: &str) -> std::result::Result<JsValue, JsValue> {
    let score = Score::from_json(score_json).map_err(js_error)?;
    let timeline = dsp::sequencer::score_timeline(&score).map_err(js_error)?;
    serde_wasm_bindgen::to_value(&timeline).map_err(js_error)
}

/// Render `score` and write it to `path` as 16-bit mono WAV.
/// Returns the number of samples written.
pub fn render_to_file(score: &Score, path: &Path) -> Result<usize> {
    let pcm = dsp::sequencer::render_score_pcm(score)?;
    wav::write_wav(path, &pcm, score.sample_rate)?;
    Ok(pcm.len())
}

/// What [`run`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub path: PathBuf,
    pub samples: usize,
    pub seconds: f64,
    pub playback: PlaybackOutcome,
}

/// Apply `config` to `score`, render it to the configured output file and
/// play it. Playback problems are reported in the result, never as errors.
pub fn run(score: &Score, config: &RenderConfig) -> Result<RenderReport> {
    config.validate()?;
    let score = config.apply(score);
    let samples = render_to_file(&score, &config.output)?;
    let seconds = samples as f64 / score.sample_rate as f64;
    info!(
        path = %config.output.display(),
        seconds,
        "saved"
    );
    let playback = playback::play(&config.output, config.playback);
    Ok(RenderReport {
        path: config.output.clone(),
        samples,
        seconds,
        playback,
    })
}
