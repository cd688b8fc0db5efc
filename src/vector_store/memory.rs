//! In-memory vector store implementation.
//!
//! Useful for testing.

use super::{
    check_dimensions, dimension_mismatch, missing_collection, CollectionInfo, VectorRecord,
    VectorStore,
};
use crate::error::{Result, SamleError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct Collection {
    dimensions: usize,
    created_at: DateTime<Utc>,
    records: Vec<VectorRecord>,
}

impl Collection {
    fn info(&self, name: &str) -> CollectionInfo {
        CollectionInfo {
            name: name.to_string(),
            dimensions: self.dimensions,
            record_count: self.records.len(),
            created_at: self.created_at,
        }
    }
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|e| SamleError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|e| SamleError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<CollectionInfo> {
        let mut collections = self.write()?;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Collection {
                dimensions,
                created_at: Utc::now(),
                records: Vec::new(),
            });
        if collection.dimensions != dimensions {
            return Err(dimension_mismatch(name, collection.dimensions, dimensions));
        }
        Ok(collection.info(name))
    }

    async fn add(&self, records: &[VectorRecord]) -> Result<usize> {
        let mut collections = self.write()?;

        // Validate everything first so a bad batch leaves no trace
        for record in records {
            let collection = collections
                .get(&record.collection)
                .ok_or_else(|| missing_collection(&record.collection))?;
            check_dimensions(record, collection.dimensions)?;
        }

        for record in records {
            if let Some(collection) = collections.get_mut(&record.collection) {
                collection.records.push(record.clone());
            }
        }
        Ok(records.len())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self
            .read()?
            .get(collection)
            .map(|c| c.records.len())
            .unwrap_or(0))
    }

    async fn records(&self, collection: &str) -> Result<Vec<VectorRecord>> {
        Ok(self
            .read()?
            .get(collection)
            .map(|c| c.records.clone())
            .unwrap_or_default())
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        Ok(self
            .read()?
            .iter()
            .map(|(name, collection)| collection.info(name))
            .collect())
    }
}
