//! Collections command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the collections command.
pub async fn run_collections(settings: Settings) -> Result<()> {
    if !settings.sqlite_path().exists() {
        Output::info("No vector store yet. Use 'samle ingest --pdf <file>' to add content.");
        return Ok(());
    }

    let orchestrator = Orchestrator::new(settings);
    let store = orchestrator.vector_store().await?;

    match store.list_collections().await {
        Ok(collections) => {
            if collections.is_empty() {
                Output::info("No collections yet. Use 'samle ingest --pdf <file>' to add content.");
            } else {
                Output::header(&format!("Collections ({})", collections.len()));
                println!();

                for info in &collections {
                    Output::collection_info(
                        &info.name,
                        info.dimensions,
                        info.record_count,
                        &info.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    );
                }

                let total: usize = collections.iter().map(|c| c.record_count).sum();
                println!();
                Output::kv("Total records", &total.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list collections: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
