//! Init command - first-run setup.

use super::doctor::{install_hint_ffmpeg, install_hint_ytdlp};
use crate::cli::preflight::{ffmpeg_binary, version_arg};
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Simple check result for init command.
struct CheckIssue {
    name: String,
    hint: String,
}

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Samle Setup");
    println!();

    // Step 1: Check prerequisites
    println!("{}", style("Step 1: Checking prerequisites").bold().cyan());
    println!();

    let tool_issues = check_prerequisites(settings);
    if tool_issues.is_empty() {
        Output::success("All required tools are installed!");
    } else {
        Output::warning("YouTube ingestion needs tools that are missing:");
        println!();
        for issue in &tool_issues {
            println!("  {} {} - not found", style("✗").red(), style(&issue.name).bold());
            println!("    {} {}", style("→").dim(), style(&issue.hint).dim());
        }
    }

    println!();

    // Step 2: Create directories
    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();

    for (label, dir) in [
        ("vector store", settings.persist_dir()),
        ("temp", settings.temp_dir()),
    ] {
        if dir.exists() {
            Output::info(&format!("The {} directory exists: {}", label, dir.display()));
        } else {
            std::fs::create_dir_all(&dir)?;
            Output::success(&format!("Created {} directory: {}", label, dir.display()));
        }
    }

    println!();

    // Step 3: Create config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else {
        settings.save_to(&config_path.to_path_buf())?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    }

    println!();

    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("samle doctor").cyan());
    println!("  {} Ingest a PDF", style("samle ingest --pdf <file>").cyan());
    println!("  {} Ingest a video", style("samle ingest --youtube <url>").cyan());
    println!();
    println!("For more help: {}", style("samle --help").cyan());

    Ok(())
}

/// Check prerequisites and return any issues.
fn check_prerequisites(settings: &Settings) -> Vec<CheckIssue> {
    let downloader = Settings::expand_path(&settings.youtube.downloader);
    let ffmpeg = ffmpeg_binary(settings);

    [
        (downloader.to_string_lossy().into_owned(), install_hint_ytdlp()),
        (ffmpeg.to_string_lossy().into_owned(), install_hint_ffmpeg()),
    ]
    .into_iter()
    .filter(|(program, _)| Command::new(program).arg(version_arg(program)).output().is_err())
    .map(|(name, hint)| CheckIssue {
        name,
        hint: hint.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_directories_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.temp_dir = dir.path().join("tmp").to_string_lossy().into_owned();
        settings.storage.persist_dir = dir.path().join("db").to_string_lossy().into_owned();
        let config_path = dir.path().join("conf").join("config.toml");

        run_init(&settings, &config_path).unwrap();

        assert!(dir.path().join("tmp").is_dir());
        assert!(dir.path().join("db").is_dir());
        let loaded = Settings::load_from(Some(&config_path)).unwrap();
        assert_eq!(loaded.storage.persist_dir, settings.storage.persist_dir);
    }

    #[test]
    fn test_missing_downloader_is_reported() {
        let mut settings = Settings::default();
        settings.youtube.downloader = "samle-missing-downloader".to_string();

        let issues = check_prerequisites(&settings);
        assert!(issues.iter().any(|i| i.name == "samle-missing-downloader"));
    }
}
