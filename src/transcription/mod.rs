//! Transcription module for Samle.
//!
//! Speech-to-text runs locally with a Whisper model loaded through candle.
//! Audio is decoded, resampled to 16 kHz and transcribed in 30-second
//! windows, each window becoming one timed segment.

mod mel;
mod models;
mod whisper;

pub use models::{format_timestamp, Transcript, TranscriptSegment};
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return segments with timestamps.
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;
}
