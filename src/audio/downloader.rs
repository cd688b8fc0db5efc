//! Audio download via yt-dlp.
//!
//! yt-dlp fetches the best available audio stream and converts it to MP3
//! with ffmpeg. The file always lands at the same temporary path and is
//! left in place after transcription.

use crate::config::Settings;
use crate::error::{Result, SamleError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// File stem of the downloaded audio.
pub const AUDIO_FILE_STEM: &str = "temp_audio";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Fetches audio for a URL and returns the path of the local file.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<PathBuf>;
}

/// Downloader backed by the yt-dlp command-line tool.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    program: String,
    ffmpeg_location: Option<PathBuf>,
    output_dir: PathBuf,
    timeout: Duration,
}

impl YtDlpDownloader {
    /// Create a downloader writing into `output_dir`, using `yt-dlp` from PATH.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: "yt-dlp".to_string(),
            ffmpeg_location: None,
            output_dir: output_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a downloader from the `[youtube]` and `[general]` settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut downloader = Self::new(settings.temp_dir())
            .with_program(Settings::expand_path(&settings.youtube.downloader).to_string_lossy())
            .with_timeout(Duration::from_secs(settings.youtube.download_timeout_seconds));
        if let Some(location) = settings.ffmpeg_location() {
            downloader = downloader.with_ffmpeg_location(location);
        }
        downloader
    }

    /// Use a different downloader executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Point the downloader at a directory containing ffmpeg.
    pub fn with_ffmpeg_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.ffmpeg_location = Some(location.into());
        self
    }

    /// Bound how long a single download may run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path the converted MP3 is expected at.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.mp3", AUDIO_FILE_STEM))
    }

    fn output_template(&self) -> PathBuf {
        self.output_dir.join(format!("{}.%(ext)s", AUDIO_FILE_STEM))
    }

    /// Command-line arguments for a download of `url`.
    fn args(&self, url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-f".into(),
            "bestaudio".into(),
            "-x".into(),
            "--audio-format".into(),
            "mp3".into(),
        ];
        if let Some(location) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(location.clone().into_os_string());
        }
        args.push("-o".into());
        args.push(self.output_template().into_os_string());
        args.push(url.into());
        args
    }
}

#[async_trait]
impl AudioDownloader for YtDlpDownloader {
    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let target = self.output_path();
        // A leftover file from an earlier run must not pass for this download
        if tokio::fs::try_exists(&target).await? {
            debug!("Removing stale audio file {:?}", target);
            tokio::fs::remove_file(&target).await?;
        }

        info!("Downloading audio from {}", url);

        let child = Command::new(&self.program)
            .args(self.args(url))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SamleError::ToolNotFound(self.program.clone()));
            }
            Err(e) => {
                return Err(SamleError::AudioDownload(format!(
                    "{} execution failed: {e}",
                    self.program
                )));
            }
        };

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(SamleError::AudioDownload(format!(
                    "{} execution failed: {e}",
                    self.program
                )));
            }
            Err(_) => {
                return Err(SamleError::AudioDownload(format!(
                    "{} timed out after {}s",
                    self.program,
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() || !tokio::fs::try_exists(&target).await? {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SamleError::AudioDownload(stderr.into_owned()));
        }

        info!("Audio saved to {:?}", target);
        Ok(target)
    }
}
