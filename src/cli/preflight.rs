//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools are available before starting an ingest
//! that would otherwise fail after the PDFs were already parsed.

use crate::config::Settings;
use crate::error::{Result, SamleError};
use std::path::PathBuf;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingesting PDFs only needs the filesystem.
    IngestPdf,
    /// Ingesting a video needs the downloader and ffmpeg.
    IngestYoutube,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::IngestPdf => {}
        Operation::IngestYoutube => {
            let downloader = Settings::expand_path(&settings.youtube.downloader);
            check_tool(&downloader.to_string_lossy())?;
            check_tool(&ffmpeg_binary(settings).to_string_lossy())?;
        }
    }
    Ok(())
}

/// The ffmpeg executable the downloader will end up using.
pub fn ffmpeg_binary(settings: &Settings) -> PathBuf {
    match settings.ffmpeg_location() {
        Some(dir) if dir.is_dir() => dir.join("ffmpeg"),
        Some(path) => path,
        None => PathBuf::from("ffmpeg"),
    }
}

/// Argument asking `program` for its version.
pub fn version_arg(program: &str) -> &'static str {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let name = std::path::Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program);
    match name {
        "ffmpeg" | "ffprobe" | "ffmpeg.exe" | "ffprobe.exe" => "-version",
        _ => "--version",
    }
}

/// Check if an external tool is available.
fn check_tool(program: &str) -> Result<()> {
    match Command::new(program).arg(version_arg(program)).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SamleError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            program
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SamleError::ToolNotFound(program.to_string()))
        }
        Err(e) => Err(SamleError::ToolNotFound(format!("{}: {}", program, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_ingest_has_no_requirements() {
        assert!(check(Operation::IngestPdf, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_downloader_is_reported() {
        let mut settings = Settings::default();
        settings.youtube.downloader = "samle-missing-downloader".to_string();

        let err = check(Operation::IngestYoutube, &settings).unwrap_err();
        assert!(matches!(err, SamleError::ToolNotFound(ref name) if name == "samle-missing-downloader"));
    }

    #[test]
    fn test_version_arg() {
        assert_eq!(version_arg("yt-dlp"), "--version");
        assert_eq!(version_arg("/opt/ffmpeg/bin/ffmpeg"), "-version");
    }

    #[test]
    fn test_ffmpeg_binary_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.youtube.ffmpeg_location = Some(dir.path().to_string_lossy().into_owned());

        assert_eq!(ffmpeg_binary(&settings), dir.path().join("ffmpeg"));
        assert_eq!(ffmpeg_binary(&Settings::default()), PathBuf::from("ffmpeg"));
    }
}
