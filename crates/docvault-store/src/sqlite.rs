//! SQLite-backed vector engine.
//!
//! One database file per deployment, one logical collection per row of the
//! `collections` table. Embeddings are produced by the configured
//! [`Embedder`] at write time and stored as raw f32 bytes; queries rank the
//! whole collection by cosine distance in memory.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use docvault_core::{Error, Result};
use docvault_embed::Embedder;

use crate::engine::VectorEngine;
use crate::types::{EngineEntry, EngineMatch, EntryFilter};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS entries (
    entry_id TEXT NOT NULL,
    collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
    document TEXT NOT NULL,
    metadata_json TEXT NOT NULL,
    embedding BLOB NOT NULL,
    PRIMARY KEY (entry_id, collection_id)
);

CREATE INDEX IF NOT EXISTS idx_entries_collection ON entries(collection_id);
";

/// SQLite vector engine with in-process cosine ranking.
pub struct SqliteEngine {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    embedder: Arc<dyn Embedder>,
}

impl SqliteEngine {
    /// Open or create the engine database under `db_dir`.
    pub fn open(db_dir: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Database(e.to_string()))?;
        let db_path = db_dir.join("docvault.db");

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let engine = Self {
            conn: Mutex::new(conn),
            db_path,
            embedder,
        };

        info!(
            "SqliteEngine initialized: dim={}, path={}",
            engine.embedder.dimension(),
            engine.db_path.display()
        );

        Ok(engine)
    }

    fn collection_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
        conn.prepare_cached("SELECT id FROM collections WHERE name = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![name], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn get_or_create_collection(conn: &Connection, name: &str) -> Result<i64> {
        if let Some(id) = Self::collection_id(conn, name)? {
            return Ok(id);
        }
        conn.prepare_cached("INSERT INTO collections (name) VALUES (?1)")
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![name])
            .map_err(|e| Error::Database(e.to_string()))
    }
}

#[async_trait]
impl VectorEngine for SqliteEngine {
    async fn add(
        &self,
        collection: &str,
        ids: &[String],
        documents: &[String],
        metadatas: &[HashMap<String, String>],
    ) -> Result<()> {
        if ids.len() != documents.len() || ids.len() != metadatas.len() {
            return Err(Error::Engine(format!(
                "mismatched batch lengths: {} ids, {} documents, {} metadatas",
                ids.len(),
                documents.len(),
                metadatas.len()
            )));
        }

        // Embed before taking the connection lock.
        let texts: Vec<&str> = documents.iter().map(|d| d.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await;

        let conn = self.conn.lock();
        let collection_id = Self::get_or_create_collection(&conn, collection)?;

        let mut stmt = conn
            .prepare_cached(
                "INSERT OR REPLACE INTO entries
                 (entry_id, collection_id, document, metadata_json, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        for ((id, document), (metadata, embedding)) in ids
            .iter()
            .zip(documents.iter())
            .zip(metadatas.iter().zip(embeddings.iter()))
        {
            let metadata_json = serde_json::to_string(metadata)?;
            stmt.execute(params![
                id,
                collection_id,
                document,
                metadata_json,
                embedding_to_bytes(embedding),
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        }

        Ok(())
    }

    async fn get(
        &self,
        collection: &str,
        filter: Option<&EntryFilter>,
    ) -> Result<Vec<EngineEntry>> {
        let conn = self.conn.lock();
        let Some(collection_id) = Self::collection_id(&conn, collection)? else {
            return Ok(Vec::new());
        };

        let mut stmt = conn
            .prepare_cached(
                "SELECT entry_id, document, metadata_json FROM entries
                 WHERE collection_id = ?1 ORDER BY rowid",
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![collection_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, document, metadata_json) = row.map_err(|e| Error::Database(e.to_string()))?;
            let metadata: HashMap<String, String> = serde_json::from_str(&metadata_json)?;
            if filter.map(|f| f.matches(&metadata)).unwrap_or(true) {
                entries.push(EngineEntry {
                    id,
                    document,
                    metadata,
                });
            }
        }
        Ok(entries)
    }

    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        n_results: usize,
    ) -> Result<Vec<EngineMatch>> {
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query_text).await;
        let dim = self.embedder.dimension();

        let conn = self.conn.lock();
        let Some(collection_id) = Self::collection_id(&conn, collection)? else {
            return Ok(Vec::new());
        };

        let mut stmt = conn
            .prepare_cached(
                "SELECT document, metadata_json, embedding FROM entries
                 WHERE collection_id = ?1 ORDER BY rowid",
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![collection_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut documents = Vec::new();
        let mut flat = Vec::new();
        for row in rows {
            let (document, metadata_json, blob) = row.map_err(|e| Error::Database(e.to_string()))?;
            let metadata: HashMap<String, String> = serde_json::from_str(&metadata_json)?;
            // Stored vectors are padded/truncated to the current dimension so
            // a single matrix shape fits.
            let mut embedding = bytes_to_embedding(&blob);
            embedding.resize(dim, 0.0);
            flat.extend_from_slice(&embedding);
            documents.push((document, metadata));
        }
        drop(stmt);
        drop(conn);

        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = Array2::from_shape_vec((documents.len(), dim), flat)
            .map_err(|e| Error::Engine(e.to_string()))?;
        let query = Array1::from(query_embedding);
        let dots = matrix.dot(&query);
        let query_norm = query.dot(&query).sqrt();

        let mut ranked: Vec<(usize, f32)> = dots
            .iter()
            .enumerate()
            .map(|(i, &dot)| {
                let row = matrix.row(i);
                let row_norm = row.dot(&row).sqrt();
                let distance = if row_norm > 0.0 && query_norm > 0.0 {
                    1.0 - dot / (row_norm * query_norm)
                } else {
                    1.0
                };
                (i, distance)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        ranked.truncate(n_results);

        Ok(ranked
            .into_iter()
            .map(|(i, distance)| {
                let (document, metadata) = documents[i].clone();
                EngineMatch {
                    document,
                    distance,
                    metadata,
                }
            })
            .collect())
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
        let conn = self.conn.lock();
        let Some(collection_id) = Self::collection_id(&conn, collection)? else {
            return Ok(());
        };

        let mut stmt = conn
            .prepare_cached("DELETE FROM entries WHERE collection_id = ?1 AND entry_id = ?2")
            .map_err(|e| Error::Database(e.to_string()))?;
        for id in ids {
            stmt.execute(params![collection_id, id])
                .map_err(|e| Error::Database(e.to_string()))?;
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let Some(collection_id) = Self::collection_id(&conn, collection)? else {
            return Ok(0);
        };
        let count: i64 = conn
            .prepare_cached("SELECT COUNT(*) FROM entries WHERE collection_id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![collection_id], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count as usize)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT name FROM collections ORDER BY id")
            .map_err(|e| Error::Database(e.to_string()))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Database(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(names)
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached("DELETE FROM collections WHERE name = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![collection])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for v in embedding {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
