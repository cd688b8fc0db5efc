//! Configuration settings for Samle.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub storage: StorageSettings,
    pub youtube: YoutubeSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (downloaded audio).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/samle".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Vector store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the on-disk vector store.
    pub persist_dir: String,
    /// Collection that ingested records are appended to.
    pub collection: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            persist_dir: "./vector_db".to_string(),
            collection: "knowledge_base".to_string(),
        }
    }
}

/// YouTube download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Downloader executable (name on PATH or absolute path).
    pub downloader: String,
    /// Directory containing ffmpeg/ffprobe, passed to the downloader.
    pub ffmpeg_location: Option<String>,
    /// Upper bound on a single download, in seconds.
    pub download_timeout_seconds: u64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            downloader: "yt-dlp".to_string(),
            ffmpeg_location: None,
            download_timeout_seconds: 1800,
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Hugging Face repository of the Whisper model.
    pub model: String,
    /// Language code (e.g. "en"). Detected from the audio when unset.
    pub language: Option<String>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "openai/whisper-base".to_string(),
            language: None,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Hugging Face repository of the sentence-embedding model.
    pub model: String,
    /// Inputs are truncated to this many tokens.
    pub max_sequence_length: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string(),
            max_sequence_length: 128,
        }
    }
}

/// Answer generation settings. Not read by the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SamleError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("samle")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded vector store directory.
    pub fn persist_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.persist_dir)
    }

    /// Get the SQLite database file inside the vector store directory.
    pub fn sqlite_path(&self) -> PathBuf {
        self.persist_dir().join("store.sqlite3")
    }

    /// Get the expanded ffmpeg location, if configured.
    pub fn ffmpeg_location(&self) -> Option<PathBuf> {
        self.youtube
            .ffmpeg_location
            .as_deref()
            .map(Self::expand_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.storage.collection, "knowledge_base");
        assert_eq!(settings.youtube.downloader, "yt-dlp");
        assert_eq!(
            settings.embedding.model,
            "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"
        );
        assert_eq!(settings.generation.max_tokens, 1000);
        assert!(settings.sqlite_path().ends_with("vector_db/store.sqlite3"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [storage]
            collection = "lectures"

            [youtube]
            ffmpeg_location = "/opt/ffmpeg/bin"
            "#,
        )
        .unwrap();

        assert_eq!(settings.storage.collection, "lectures");
        assert_eq!(settings.storage.persist_dir, "./vector_db");
        assert_eq!(settings.ffmpeg_location(), Some(PathBuf::from("/opt/ffmpeg/bin")));
        assert_eq!(settings.youtube.download_timeout_seconds, 1800);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.transcription.language = Some("no".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.transcription.language.as_deref(), Some("no"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.general.temp_dir, "/tmp/samle");
    }
}
