//! CLI module for Samle.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Samle - PDF and YouTube ingestion into a local vector knowledge base
///
/// Loads PDFs page by page and transcribes YouTube audio locally, then
/// chunks, embeds and appends everything to an on-disk vector store.
/// The name "Samle" is Norwegian for "collect."
#[derive(Parser, Debug)]
#[command(name = "samle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SAMLE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create directories and a default configuration file
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Ingest PDFs and/or a YouTube video into the knowledge base
    Ingest {
        /// PDF file to ingest (repeatable)
        #[arg(long = "pdf", value_name = "PATH")]
        pdfs: Vec<PathBuf>,

        /// YouTube URL to download and transcribe
        #[arg(long, value_name = "URL")]
        youtube: Option<String>,
    },

    /// List collections in the vector store
    Collections,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
