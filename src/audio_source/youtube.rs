//! YouTube transcript source.

use crate::audio::AudioDownloader;
use crate::document::{Document, KIND, LANGUAGE, SOURCE, URL, VIDEO_ID};
use crate::error::Result;
use crate::transcription::Transcriber;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, instrument, warn};

static VIDEO_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Matches the common YouTube URL shapes and bare video IDs
    Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.|m\.|music\.)?
            (?:youtube\.com/watch\?(?:[^\#]*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/|youtube\.com/live/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex")
});

/// Extract the video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = VIDEO_ID_REGEX.captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Downloads a video's audio and transcribes it into a single document.
///
/// The document is tagged `source = "youtube"` and carries the URL it was
/// fetched from. No retries; the downloaded audio file is left on disk.
pub struct YoutubeTranscriber {
    downloader: Arc<dyn AudioDownloader>,
    transcriber: Arc<dyn Transcriber>,
}

impl YoutubeTranscriber {
    pub fn new(downloader: Arc<dyn AudioDownloader>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            downloader,
            transcriber,
        }
    }

    /// Download, transcribe and wrap the transcript of `url`.
    #[instrument(skip(self))]
    pub async fn load(&self, url: &str) -> Result<Document> {
        let audio_path = self.downloader.download(url).await?;
        let transcript = self.transcriber.transcribe(&audio_path).await?;

        if transcript.is_empty() {
            warn!("No speech recognized in {}", url);
        }
        info!(
            "Transcript of {} has {} characters",
            url,
            transcript.full_text.chars().count()
        );

        let mut document = Document::new(transcript.full_text)
            .with_metadata(KIND, "youtube")
            .with_metadata(SOURCE, "youtube")
            .with_metadata(URL, url);
        if let Some(video_id) = extract_video_id(url) {
            document = document.with_metadata(VIDEO_ID, video_id);
        }
        if let Some(language) = transcript.language {
            document = document.with_metadata(LANGUAGE, language);
        }
        Ok(document)
    }
}
