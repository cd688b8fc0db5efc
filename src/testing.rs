//! Shared fixtures and test doubles.

use crate::audio::AudioDownloader;
use crate::embedding::Embedder;
use crate::error::{Result, SamleError};
use crate::transcription::{Transcript, TranscriptSegment, Transcriber};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

#[path = "../tests/common/mod.rs"]
mod pdf_fixture;

pub(crate) use pdf_fixture::{identity_h_font, write_pdf, write_pdf_with};

/// Downloader double returning a fixed path or a fixed stderr failure.
pub(crate) struct FakeDownloader {
    stderr: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeDownloader {
    pub fn ok() -> Self {
        Self {
            stderr: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            stderr: Some(stderr.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioDownloader for FakeDownloader {
    async fn download(&self, _url: &str) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.stderr {
            Some(stderr) => Err(SamleError::AudioDownload(stderr.clone())),
            None => Ok(PathBuf::from("/tmp/samle/temp_audio.mp3")),
        }
    }
}

/// Transcriber double producing one 30-second segment per entry.
pub(crate) struct FakeTranscriber {
    segments: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let segments = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, text)| {
                TranscriptSegment::new(i as f64 * 30.0, (i + 1) as f64 * 30.0, text.clone())
            })
            .collect();
        Ok(Transcript::new(segments, Some("en".to_string())))
    }
}

/// Embedder double returning deliberately non-unit vectors.
pub(crate) struct FakeEmbedder {
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(text: &str) -> Vec<f32> {
        vec![text.chars().count() as f32, 3.0, 4.0, 12.0]
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}
