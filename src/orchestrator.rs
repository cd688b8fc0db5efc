//! Pipeline orchestrator for Samle.
//!
//! Coordinates the ingestion of PDFs and YouTube audio into the vector
//! store: load, transcribe, chunk, embed, persist.

use crate::audio::{AudioDownloader, YtDlpDownloader};
use crate::audio_source::YoutubeTranscriber;
use crate::chunking::chunk_documents;
use crate::config::Settings;
use crate::document::Document;
use crate::embedding::{l2_normalize, BertEmbedder, Embedder};
use crate::error::{Result, SamleError};
use crate::loader::{load_all, DocumentLoader, PdfLoader};
use crate::transcription::{Transcriber, WhisperTranscriber};
use crate::vector_store::{SqliteVectorStore, VectorRecord, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Samle pipeline.
pub struct Orchestrator {
    settings: Settings,
    loader: Arc<dyn DocumentLoader>,
    youtube: YoutubeTranscriber,
    embedder: Arc<dyn Embedder>,
    vector_store: OnceCell<Arc<dyn VectorStore>>,
}

impl Orchestrator {
    /// Create an orchestrator wired to yt-dlp, Whisper, the BERT embedder and
    /// the on-disk store.
    ///
    /// Nothing is loaded or opened until [`Orchestrator::ingest`] needs it.
    pub fn new(settings: Settings) -> Self {
        let downloader = Arc::new(YtDlpDownloader::from_settings(&settings));
        let transcriber = Arc::new(WhisperTranscriber::from_settings(&settings.transcription));
        let embedder = Arc::new(BertEmbedder::from_settings(&settings.embedding));

        Self {
            loader: Arc::new(PdfLoader::new()),
            youtube: YoutubeTranscriber::new(downloader, transcriber),
            embedder,
            vector_store: OnceCell::new(),
            settings,
        }
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        downloader: Arc<dyn AudioDownloader>,
        transcriber: Arc<dyn Transcriber>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            settings,
            loader: Arc::new(PdfLoader::new()),
            youtube: YoutubeTranscriber::new(downloader, transcriber),
            embedder,
            vector_store: OnceCell::new_with(Some(vector_store)),
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the vector store, opening the on-disk store on first use.
    pub async fn vector_store(&self) -> Result<Arc<dyn VectorStore>> {
        let store = self
            .vector_store
            .get_or_try_init(|| async {
                let store = SqliteVectorStore::new(&self.settings.sqlite_path())?;
                Ok::<_, SamleError>(Arc::new(store) as Arc<dyn VectorStore>)
            })
            .await?;
        Ok(Arc::clone(store))
    }

    /// Ingest PDFs and/or a YouTube video and return the number of chunks
    /// written to the configured collection.
    ///
    /// PDFs are loaded first, in the given order, then the video transcript.
    /// At least one source is required; an empty URL counts as no URL. The
    /// first failing step aborts the call and nothing written earlier in the
    /// call is rolled back.
    #[instrument(skip(self, pdf_paths), fields(pdfs = pdf_paths.len()))]
    pub async fn ingest(&self, pdf_paths: &[PathBuf], youtube_url: Option<&str>) -> Result<usize> {
        let youtube_url = youtube_url.map(str::trim).filter(|url| !url.is_empty());
        if pdf_paths.is_empty() && youtube_url.is_none() {
            return Err(SamleError::InvalidInput(
                "No PDF files or YouTube URL provided".to_string(),
            ));
        }

        let mut documents = Vec::new();

        if !pdf_paths.is_empty() {
            info!("Loading {} PDF file(s)", pdf_paths.len());
            let loader = Arc::clone(&self.loader);
            let paths = pdf_paths.to_vec();
            let pages = tokio::task::spawn_blocking(move || load_all(loader.as_ref(), &paths))
                .await
                .map_err(|e| SamleError::Io(std::io::Error::other(e)))??;
            info!("Loaded {} pages", pages.len());
            documents.extend(pages);
        }

        if let Some(url) = youtube_url {
            info!("Transcribing {}", url);
            documents.push(self.youtube.load(url).await?);
        }

        let chunks = chunk_documents(&documents);
        info!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        if chunks.is_empty() {
            warn!("No text to index");
            return Ok(0);
        }

        self.index_chunks(&chunks).await
    }

    /// Embed chunks and append them to the configured collection.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn index_chunks(&self, chunks: &[Document]) -> Result<usize> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(SamleError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let collection = self.settings.storage.collection.as_str();
        let mut records = Vec::with_capacity(chunks.len());
        for (chunk, mut embedding) in chunks.iter().zip(embeddings) {
            l2_normalize(&mut embedding)?;
            records.push(VectorRecord::new(collection, chunk, embedding));
        }

        let dimensions = records[0].embedding.len();
        let store = self.vector_store().await?;
        store.ensure_collection(collection, dimensions).await?;
        let added = store.add(&records).await?;

        info!("Indexed {} chunks into '{}'", added, collection);
        Ok(added)
    }
}
