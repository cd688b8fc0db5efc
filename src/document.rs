//! Text documents flowing through the ingestion pipeline.
//!
//! Loaders and the transcriber produce [`Document`]s, the chunker turns them
//! into smaller documents that inherit their parent's metadata, and the
//! vector store persists the chunks alongside their embeddings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key naming the kind of source ("pdf", "youtube").
pub const KIND: &str = "kind";
/// Metadata key naming the origin (file path, or "youtube").
pub const SOURCE: &str = "source";
/// Metadata key for the 0-based PDF page index.
pub const PAGE: &str = "page";
/// Metadata key for the original YouTube URL.
pub const URL: &str = "url";
/// Metadata key for the 11-character YouTube video id.
pub const VIDEO_ID: &str = "video_id";
/// Metadata key for the transcript language code.
pub const LANGUAGE: &str = "language";
/// Metadata key for the 0-based position of a chunk inside its parent.
pub const CHUNK_INDEX: &str = "chunk_index";

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Int(i64),
    Text(String),
}

impl MetadataValue {
    /// Borrow the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            MetadataValue::Int(_) => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(i) => Some(*i),
            MetadataValue::Text(_) => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Int(value as i64)
    }
}

/// Ordered document metadata.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A piece of text plus the metadata describing where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Text content.
    pub content: String,
    /// Source metadata.
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Look up a metadata entry.
    pub fn meta(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_builder() {
        let doc = Document::new("hello")
            .with_metadata(SOURCE, "notes.pdf")
            .with_metadata(PAGE, 3usize);

        assert_eq!(doc.meta(SOURCE).and_then(|v| v.as_str()), Some("notes.pdf"));
        assert_eq!(doc.meta(PAGE).and_then(|v| v.as_int()), Some(3));
        assert!(doc.meta(URL).is_none());
    }

    #[test]
    fn test_metadata_json_shape() {
        let doc = Document::new("x")
            .with_metadata(SOURCE, "youtube")
            .with_metadata(CHUNK_INDEX, 0usize);

        let json = serde_json::to_string(&doc.metadata).unwrap();
        assert_eq!(json, r#"{"chunk_index":0,"source":"youtube"}"#);

        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc.metadata);
    }
}
