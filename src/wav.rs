//! WAV output: 16-bit mono PCM.
//!
//! Encoding and decoding go through `hound` both in memory and on disk;
//! [`encode_wav`] is what the WASM bindings hand back to the browser.

use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use tracing::info;

use crate::dsp::sequencer::render_score_pcm;
use crate::error::Result;
use crate::score::Score;

fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Render a score and encode it as WAV bytes.
pub fn render_wav(score: &Score) -> Result<Vec<u8>> {
    let pcm = render_score_pcm(score)?;
    encode_wav(&pcm, score.sample_rate)
}

fn write_pcm<W: Write + Seek>(out: W, samples: &[i16], sample_rate: u32) -> Result<()> {
    let mut writer = hound::WavWriter::new(out, wav_spec(sample_rate))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Encode mono i16 samples as a complete WAV file in memory.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    write_pcm(&mut cursor, samples, sample_rate)?;
    Ok(cursor.into_inner())
}

/// Decode WAV bytes into samples and the sample rate.
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<i16>, u32)> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let sample_rate = reader.spec().sample_rate;
    let samples = reader.samples::<i16>().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((samples, sample_rate))
}

/// Write samples to `path`, creating parent directories as needed.
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    write_pcm(BufWriter::new(File::create(path)?), samples, sample_rate)?;

    info!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate,
        "wav written"
    );
    Ok(())
}

pub fn read_wav(path: &Path) -> Result<(Vec<i16>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let sample_rate = reader.spec().sample_rate;
    let samples = reader.samples::<i16>().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((samples, sample_rate))
}
