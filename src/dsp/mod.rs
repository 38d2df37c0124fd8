//! DSP stages: pure functions from parameters and buffers to new buffers.
//!
//! All synthesis runs in f64 on mono buffers and is deterministic, so the
//! WASM bindings and the CLI renderer produce identical samples.

pub mod buffer;
pub mod envelope;
pub mod mixer;
pub mod normalize;
pub mod oscillator;
pub mod reverb;
pub mod sequencer;
