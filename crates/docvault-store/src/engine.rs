//! The opaque vector engine contract.
//!
//! Collections are created lazily on first write. Reads against a missing
//! collection return empty results, and dropping a missing collection is a
//! no-op — callers never need to check for existence first.

use async_trait::async_trait;
use std::collections::HashMap;

use docvault_core::Result;

use crate::types::{EngineEntry, EngineMatch, EntryFilter};

#[async_trait]
pub trait VectorEngine: Send + Sync {
    /// Add entries to a collection, creating it if needed.
    /// Re-adding an existing id overwrites that entry.
    async fn add(
        &self,
        collection: &str,
        ids: &[String],
        documents: &[String],
        metadatas: &[HashMap<String, String>],
    ) -> Result<()>;

    /// All entries of a collection, optionally filtered by exact-match
    /// metadata fields.
    async fn get(&self, collection: &str, filter: Option<&EntryFilter>)
        -> Result<Vec<EngineEntry>>;

    /// The `n_results` entries nearest to `query_text`, ranked by
    /// ascending distance.
    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        n_results: usize,
    ) -> Result<Vec<EngineMatch>>;

    /// Delete entries by id. Unknown ids are ignored.
    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()>;

    /// Number of entries in a collection (0 when missing).
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Names of all collections.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Remove a collection and all its entries. No-op when missing.
    async fn drop_collection(&self, collection: &str) -> Result<()>;
}
