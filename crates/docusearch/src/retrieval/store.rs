//! SQLite backing store for index entries
//!
//! Each row holds one chunk, its provenance and its embedding (little-endian
//! `f32` blob). Rows are keyed by their own entry id, so the same chunk may
//! be stored more than once. Similarity is computed in process over all rows.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource};

/// A chunk together with its stored embedding
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// Insertion order
    pub rowid: i64,
    /// Identifier assigned by the store at insert time
    pub entry_id: Uuid,
    /// The chunk
    pub chunk: Chunk,
    /// Unit-length embedding
    pub embedding: Vec<f32>,
}

/// SQLite-backed entry store
pub struct IndexStore {
    conn: Arc<Mutex<Connection>>,
}

impl IndexStore {
    /// Create or open the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("Failed to open index database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("Failed to open in-memory database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            "#,
        )
        .map_err(|e| Error::storage(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                rowid INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_id TEXT NOT NULL UNIQUE,
                chunk_id TEXT NOT NULL,
                source TEXT NOT NULL,
                paper TEXT NOT NULL,
                page INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entries_source ON entries(source);
            "#,
        )
        .map_err(|e| Error::storage(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    /// Insert chunks with their embeddings in one transaction
    pub fn insert_entries(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::internal(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::storage(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT INTO entries (
                        entry_id, chunk_id, source, paper, page, chunk_index, content,
                        embedding, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                )
                .map_err(|e| Error::storage(format!("Failed to prepare statement: {}", e)))?;

            let now = Utc::now().to_rfc3339();
            for (chunk, embedding) in chunks.iter().zip(embeddings) {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    chunk.id.to_string(),
                    chunk.source.filename,
                    chunk.source.paper,
                    chunk.source.page_number as i64,
                    chunk.chunk_index as i64,
                    chunk.content,
                    encode_embedding(embedding),
                    &now,
                ])
                .map_err(|e| Error::storage(format!("Failed to insert entry: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| Error::storage(format!("Failed to commit transaction: {}", e)))?;

        Ok(chunks.len())
    }

    /// Delete every entry whose source filename matches
    pub fn delete_by_source(&self, filename: &str) -> Result<usize> {
        let conn = self.conn.lock();

        let deleted = conn
            .execute("DELETE FROM entries WHERE source = ?1", params![filename])
            .map_err(|e| Error::storage(format!("Failed to delete entries: {}", e)))?;

        Ok(deleted)
    }

    /// Total entry count
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .map_err(|e| Error::storage(format!("Failed to count entries: {}", e)))?;

        Ok(count as usize)
    }

    /// All entries in insertion order
    pub fn all_entries(&self) -> Result<Vec<StoredEntry>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT rowid, entry_id, chunk_id, source, page, chunk_index, content, embedding
                 FROM entries ORDER BY rowid",
            )
            .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

        let entries = stmt
            .query_map([], |row| {
                let entry_id: String = row.get(1)?;
                let chunk_id: String = row.get(2)?;
                let source: String = row.get(3)?;
                let page: i64 = row.get(4)?;
                let chunk_index: i64 = row.get(5)?;
                let blob: Vec<u8> = row.get(7)?;

                let mut chunk = Chunk::new(
                    row.get(6)?,
                    ChunkSource::pdf(source, page as u32),
                    chunk_index as u32,
                );
                if let Ok(id) = Uuid::parse_str(&chunk_id) {
                    chunk.id = id;
                }

                Ok(StoredEntry {
                    rowid: row.get(0)?,
                    entry_id: Uuid::parse_str(&entry_id).unwrap_or_else(|_| Uuid::nil()),
                    chunk,
                    embedding: decode_embedding(&blob),
                })
            })
            .map_err(|e| Error::storage(format!("Failed to query entries: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Distinct source filenames in first-insertion order
    pub fn distinct_sources(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT source FROM entries GROUP BY source ORDER BY MIN(rowid)")
            .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

        let sources = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| Error::storage(format!("Failed to query sources: {}", e)))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(sources)
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
