//! Configuration module for Samle.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    EmbeddingSettings, GeneralSettings, GenerationSettings, Settings, StorageSettings,
    TranscriptionSettings, YoutubeSettings,
};
