//! Samle - PDF and YouTube ingestion
//!
//! A local-first CLI tool for turning PDFs and YouTube videos into a
//! persistent vector knowledge base.
//!
//! The name "Samle" comes from the Norwegian word for "collect."
//!
//! # Overview
//!
//! Samle allows you to:
//! - Load PDFs page by page, keeping the page number of every passage
//! - Download YouTube audio and transcribe it locally with Whisper
//! - Split everything into overlapping chunks and embed them with a
//!   multilingual sentence-transformer
//! - Append the chunks to an on-disk vector store
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `document` - Text documents and their metadata
//! - `loader` - PDF loading
//! - `audio` - Audio download and decoding
//! - `transcription` - Speech-to-text transcription
//! - `audio_source` - YouTube videos as documents
//! - `chunking` - Recursive character splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use samle::config::Settings;
//! use samle::orchestrator::Orchestrator;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings);
//!
//!     let pdfs = vec![PathBuf::from("paper.pdf")];
//!     let count = orchestrator
//!         .ingest(&pdfs, Some("https://youtu.be/dQw4w9WgXcQ"))
//!         .await?;
//!     println!("Processed {} chunks", count);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod audio_source;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod orchestrator;
pub mod transcription;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{Result, SamleError};
