//! Vector store abstraction for Samle.
//!
//! Records are grouped into named collections. A collection's embedding
//! dimensionality is fixed by its first write, and records are only ever
//! appended.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::document::{Document, Metadata};
use crate::error::{Result, SamleError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An embedded chunk stored in a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique record ID.
    pub id: Uuid,
    /// Collection this record belongs to.
    pub collection: String,
    /// Text content of the chunk.
    pub content: String,
    /// Metadata inherited from the source document.
    pub metadata: Metadata,
    /// Unit-length embedding vector.
    pub embedding: Vec<f32>,
    /// When this record was written.
    pub created_at: DateTime<Utc>,
}

impl VectorRecord {
    /// Create a record for `document` in `collection`.
    pub fn new(collection: impl Into<String>, document: &Document, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection: collection.into(),
            content: document.content.clone(),
            metadata: document.metadata.clone(),
            embedding,
            created_at: Utc::now(),
        }
    }
}

/// Summary of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Embedding dimensionality, fixed at creation.
    pub dimensions: usize,
    /// Number of stored records.
    pub record_count: usize,
    /// When the collection was created.
    pub created_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create `name` with the given dimensionality, or open it if it exists.
    ///
    /// Fails if the collection exists with a different dimensionality.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<CollectionInfo>;

    /// Append records to their collections in a single write.
    ///
    /// Every record's collection must exist and match its dimensionality.
    async fn add(&self, records: &[VectorRecord]) -> Result<usize>;

    /// Number of records in a collection (0 if it does not exist).
    async fn count(&self, collection: &str) -> Result<usize>;

    /// All records of a collection, in insertion order.
    async fn records(&self, collection: &str) -> Result<Vec<VectorRecord>>;

    /// All collections, ordered by name.
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>>;
}

/// Reject a record whose embedding does not fit its collection.
pub(crate) fn check_dimensions(record: &VectorRecord, dimensions: usize) -> Result<()> {
    if record.embedding.len() != dimensions {
        return Err(SamleError::VectorStore(format!(
            "record {} has {} dimensions, collection '{}' expects {}",
            record.id,
            record.embedding.len(),
            record.collection,
            dimensions
        )));
    }
    Ok(())
}

pub(crate) fn dimension_mismatch(name: &str, existing: usize, requested: usize) -> SamleError {
    SamleError::VectorStore(format!(
        "collection '{}' has {} dimensions, got {}",
        name, existing, requested
    ))
}

pub(crate) fn missing_collection(name: &str) -> SamleError {
    SamleError::VectorStore(format!("collection '{}' does not exist", name))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::document::SOURCE;

    pub(crate) fn record(collection: &str, text: &str, embedding: Vec<f32>) -> VectorRecord {
        let doc = Document::new(text).with_metadata(SOURCE, "test.pdf");
        VectorRecord::new(collection, &doc, embedding)
    }

    /// Behaviour every store must share.
    pub(crate) async fn exercise_store(store: &dyn VectorStore) {
        assert!(store.list_collections().await.unwrap().is_empty());
        assert_eq!(store.count("knowledge_base").await.unwrap(), 0);

        let info = store.ensure_collection("knowledge_base", 3).await.unwrap();
        assert_eq!(info.dimensions, 3);
        assert_eq!(info.record_count, 0);

        // Reopening keeps the collection
        let again = store.ensure_collection("knowledge_base", 3).await.unwrap();
        assert_eq!(again.created_at, info.created_at);

        let first = vec![
            record("knowledge_base", "alpha", vec![1.0, 0.0, 0.0]),
            record("knowledge_base", "beta", vec![0.0, 1.0, 0.0]),
        ];
        assert_eq!(store.add(&first).await.unwrap(), 2);

        // Identical content is appended, not merged
        let duplicate = vec![record("knowledge_base", "alpha", vec![1.0, 0.0, 0.0])];
        store.add(&duplicate).await.unwrap();

        let records = store.records("knowledge_base").await.unwrap();
        let contents: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["alpha", "beta", "alpha"]);
        assert_eq!(records[0].metadata, first[0].metadata);
        assert_eq!(records[1].embedding, vec![0.0, 1.0, 0.0]);
        assert_eq!(store.count("knowledge_base").await.unwrap(), 3);

        // Dimensionality is fixed by the first write
        assert!(store.ensure_collection("knowledge_base", 4).await.is_err());
        let wrong = vec![record("knowledge_base", "gamma", vec![1.0, 0.0])];
        assert!(store.add(&wrong).await.is_err());
        assert_eq!(store.count("knowledge_base").await.unwrap(), 3);

        // Unknown collections are rejected
        let orphan = vec![record("missing", "delta", vec![1.0])];
        assert!(store.add(&orphan).await.is_err());

        store.ensure_collection("archive", 2).await.unwrap();
        let names: Vec<(String, usize)> = store
            .list_collections()
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.name, c.record_count))
            .collect();
        assert_eq!(
            names,
            vec![("archive".to_string(), 0), ("knowledge_base".to_string(), 3)]
        );
    }

    #[test]
    fn test_record_inherits_document() {
        let doc = Document::new("text").with_metadata(SOURCE, "a.pdf");
        let record = VectorRecord::new("kb", &doc, vec![1.0]);
        assert_eq!(record.collection, "kb");
        assert_eq!(record.content, "text");
        assert_eq!(record.metadata, doc.metadata);

        let other = VectorRecord::new("kb", &doc, vec![1.0]);
        assert_ne!(record.id, other.id);
    }
}
