//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 blobs next to the chunk text
//! and its JSON-encoded metadata.

use super::{
    check_dimensions, dimension_mismatch, missing_collection, CollectionInfo, VectorRecord,
    VectorStore,
};
use crate::error::{Result, SamleError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS collections (
        name TEXT PRIMARY KEY,
        dimensions INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS records (
        id TEXT PRIMARY KEY,
        collection TEXT NOT NULL REFERENCES collections(name),
        content TEXT NOT NULL,
        metadata TEXT NOT NULL,
        embedding BLOB NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite vector store at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SamleError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| SamleError::VectorStore(format!("Invalid timestamp '{}': {}", value, e)))
    }

    fn collection_info(conn: &Connection, name: &str) -> Result<Option<CollectionInfo>> {
        let row = conn
            .query_row(
                r#"
                SELECT c.name, c.dimensions, c.created_at,
                       (SELECT COUNT(*) FROM records r WHERE r.collection = c.name)
                FROM collections c
                WHERE c.name = ?1
                "#,
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(name, dimensions, created_at, count)| {
            Ok(CollectionInfo {
                name,
                dimensions: dimensions as usize,
                record_count: count as usize,
                created_at: Self::parse_timestamp(&created_at)?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self))]
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<CollectionInfo> {
        let conn = self.lock()?;

        if let Some(info) = Self::collection_info(&conn, name)? {
            if info.dimensions != dimensions {
                return Err(dimension_mismatch(name, info.dimensions, dimensions));
            }
            debug!("Appending to existing collection '{}'", name);
            return Ok(info);
        }

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO collections (name, dimensions, created_at) VALUES (?1, ?2, ?3)",
            params![name, dimensions as i64, created_at.to_rfc3339()],
        )?;

        info!("Created collection '{}' ({} dimensions)", name, dimensions);
        Self::collection_info(&conn, name)?.ok_or_else(|| missing_collection(name))
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn add(&self, records: &[VectorRecord]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let mut dimensions: HashMap<&str, usize> = HashMap::new();
        for record in records {
            let expected = match dimensions.get(record.collection.as_str()) {
                Some(d) => *d,
                None => {
                    let d: i64 = tx
                        .query_row(
                            "SELECT dimensions FROM collections WHERE name = ?1",
                            params![record.collection],
                            |row| row.get(0),
                        )
                        .optional()?
                        .ok_or_else(|| missing_collection(&record.collection))?;
                    dimensions.insert(record.collection.as_str(), d as usize);
                    d as usize
                }
            };
            check_dimensions(record, expected)?;

            tx.execute(
                r#"
                INSERT INTO records (id, collection, content, metadata, embedding, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    record.id.to_string(),
                    record.collection,
                    record.content,
                    serde_json::to_string(&record.metadata)?,
                    Self::embedding_to_bytes(&record.embedding),
                    record.created_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Added {} records", records.len());
        Ok(records.len())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn records(&self, collection: &str) -> Result<Vec<VectorRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, content, metadata, embedding, created_at
            FROM records
            WHERE collection = ?1
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let records = rows
            .into_iter()
            .map(|(id, content, metadata, embedding, created_at)| {
                Ok(VectorRecord {
                    id: uuid::Uuid::parse_str(&id)
                        .map_err(|e| SamleError::VectorStore(format!("Invalid id '{}': {}", id, e)))?,
                    collection: collection.to_string(),
                    content,
                    metadata: serde_json::from_str(&metadata)?,
                    embedding: Self::bytes_to_embedding(&embedding),
                    created_at: Self::parse_timestamp(&created_at)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Read {} records from '{}'", records.len(), collection);
        Ok(records)
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM collections ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut collections = Vec::with_capacity(names.len());
        for name in names {
            if let Some(info) = Self::collection_info(&conn, &name)? {
                collections.push(info);
            }
        }
        Ok(collections)
    }
}
