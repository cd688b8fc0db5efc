//! End-to-end ingestion into the on-disk store, with model-backed stages
//! replaced by deterministic doubles.

mod common;

use async_trait::async_trait;
use common::write_pdf;
use samle::audio::AudioDownloader;
use samle::config::Settings;
use samle::embedding::Embedder;
use samle::orchestrator::Orchestrator;
use samle::transcription::{Transcriber, Transcript, TranscriptSegment};
use samle::vector_store::{SqliteVectorStore, VectorStore};
use samle::{Result, SamleError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct StubDownloader;

#[async_trait]
impl AudioDownloader for StubDownloader {
    async fn download(&self, _url: &str) -> Result<PathBuf> {
        Ok(PathBuf::from("temp_audio.mp3"))
    }
}

struct StubTranscriber;

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> Result<Transcript> {
        Ok(Transcript::new(
            vec![TranscriptSegment::new(0.0, 4.0, "A short spoken introduction.".to_string())],
            Some("en".to_string()),
        ))
    }
}

/// Hashes characters into a small vector; never normalized.
struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![1.0f32; 8];
        for (i, c) in text.chars().enumerate() {
            v[i % 8] += (c as u32 % 17) as f32;
        }
        Ok(v)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

fn orchestrator(store_path: &Path) -> Orchestrator {
    let store = SqliteVectorStore::new(store_path).unwrap();
    Orchestrator::with_components(
        Settings::default(),
        Arc::new(StubDownloader),
        Arc::new(StubTranscriber),
        Arc::new(HashEmbedder),
        Arc::new(store),
    )
}

#[tokio::test]
async fn test_ingest_persists_normalized_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "guide.pdf", &["Chapter one text", "Chapter two text"]);
    let store_path = dir.path().join("db").join("store.sqlite3");

    let count = orchestrator(&store_path)
        .ingest(&[pdf], Some("https://youtu.be/dQw4w9WgXcQ"))
        .await
        .unwrap();
    assert_eq!(count, 3);

    // Reopen to read what actually reached disk
    let store = SqliteVectorStore::new(&store_path).unwrap();
    let records = store.records("knowledge_base").await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].metadata["source"].as_str(), Some("youtube"));
    assert_eq!(records[2].content, "A short spoken introduction.");
    for record in &records {
        let norm = record.embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    let collections = store.list_collections().await.unwrap();
    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0].dimensions, 8);
}

#[tokio::test]
async fn test_second_run_appends() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "once.pdf", &["Only page"]);
    let store_path = dir.path().join("store.sqlite3");

    for _ in 0..2 {
        let count = orchestrator(&store_path).ingest(&[pdf.clone()], None).await.unwrap();
        assert_eq!(count, 1);
    }

    let store = SqliteVectorStore::new(&store_path).unwrap();
    assert_eq!(store.count("knowledge_base").await.unwrap(), 2);
}

#[tokio::test]
async fn test_nothing_to_ingest_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.sqlite3");

    let err = orchestrator(&store_path).ingest(&[], None).await.unwrap_err();
    assert!(matches!(err, SamleError::InvalidInput(_)));
}
