//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::PathBuf;

/// Run the ingest command.
pub async fn run_ingest(pdfs: &[PathBuf], youtube: Option<&str>, settings: Settings) -> Result<()> {
    let youtube = youtube.map(str::trim).filter(|url| !url.is_empty());

    // Pre-flight checks
    let operation = if youtube.is_some() {
        Operation::IngestYoutube
    } else {
        Operation::IngestPdf
    };
    if let Err(e) = preflight::check(operation, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'samle doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    for pdf in pdfs {
        Output::info(&format!("PDF: {}", pdf.display()));
    }
    if let Some(url) = youtube {
        Output::info(&format!("YouTube: {}", url));
    }

    let orchestrator = Orchestrator::new(settings);

    let spinner = Output::spinner("Ingesting sources...");
    let result = orchestrator.ingest(pdfs, youtube).await;
    spinner.finish_and_clear();

    match result {
        Ok(0) => {
            Output::warning("No text found in the given sources. Nothing was stored.");
        }
        Ok(count) => {
            Output::success(&format!(
                "Processed {} chunks into '{}'",
                count,
                orchestrator.settings().storage.collection
            ));
        }
        Err(e) => {
            Output::error(&format!("Failed to ingest: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
