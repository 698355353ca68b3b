//! Collection-scoped document store over the vector engine.
//!
//! Owns the collection naming convention, stable chunk ids, and the
//! document/folder deletion semantics built on metadata matching.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use md5::{Digest, Md5};
use tracing::{debug, info};

use docvault_core::{Error, Result};

use crate::engine::VectorEngine;
use crate::types::{DocumentListing, EngineEntry, EntryFilter};

/// Per-user collection name. The raw-customer-id naming of earlier
/// deployments is deliberately not supported.
pub fn collection_for_user(username: &str) -> String {
    let sanitized: String = username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("user_{}_docs", sanitized)
}

/// Stable document identifier for an uploaded file.
pub fn document_id_for_file(file_name: &str) -> String {
    file_name.replace('.', "_")
}

/// Stable document identifier for fetched web content.
pub fn document_id_for_url(url: &str) -> String {
    hex::encode(Md5::digest(url.as_bytes()))
}

/// Document store adapter scoping engine operations to named collections.
#[derive(Clone)]
pub struct DocumentStore {
    engine: Arc<dyn VectorEngine>,
}

impl DocumentStore {
    pub fn new(engine: Arc<dyn VectorEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<dyn VectorEngine> {
        &self.engine
    }

    /// Write one entry per chunk in a single batch. Ids are
    /// `<document_id>_doc_<index>`, so re-ingesting the same document
    /// overwrites its previous chunks instead of duplicating them.
    pub async fn upsert_chunks(
        &self,
        collection: &str,
        document_id: &str,
        chunks: &[String],
        metadata: &HashMap<String, String>,
    ) -> Result<usize> {
        let ids: Vec<String> = (0..chunks.len())
            .map(|i| format!("{}_doc_{}", document_id, i))
            .collect();
        let metadatas = vec![metadata.clone(); chunks.len()];

        self.engine
            .add(collection, &ids, chunks, &metadatas)
            .await?;

        info!(
            "Stored {} chunks for '{}' in collection '{}'",
            chunks.len(),
            document_id,
            collection
        );
        Ok(chunks.len())
    }

    /// All entries, optionally filtered by exact-match metadata fields.
    pub async fn get(
        &self,
        collection: &str,
        filter: Option<&EntryFilter>,
    ) -> Result<Vec<EngineEntry>> {
        self.engine.get(collection, filter).await
    }

    /// Delete every chunk whose `document_name` matches. Returns the number
    /// of entries removed; no match is `NotFound`.
    pub async fn delete_document(&self, collection: &str, document_name: &str) -> Result<usize> {
        let filter = EntryFilter::by_document(document_name);
        let entries = self.engine.get(collection, Some(&filter)).await?;
        if entries.is_empty() {
            return Err(Error::NotFound(format!(
                "document '{}' in collection '{}'",
                document_name, collection
            )));
        }
        let ids: Vec<String> = entries.into_iter().map(|e| e.id).collect();
        self.engine.delete(collection, &ids).await?;
        info!(
            "Deleted {} chunks of '{}' from '{}'",
            ids.len(),
            document_name,
            collection
        );
        Ok(ids.len())
    }

    /// Delete every chunk whose `folder_name` matches. Zero matches is
    /// success — folder deletion is idempotent.
    pub async fn delete_folder(&self, collection: &str, folder_name: &str) -> Result<usize> {
        let filter = EntryFilter::by_folder(folder_name);
        let entries = self.engine.get(collection, Some(&filter)).await?;
        if entries.is_empty() {
            debug!("No chunks in folder '{}' of '{}'", folder_name, collection);
            return Ok(0);
        }
        let ids: Vec<String> = entries.into_iter().map(|e| e.id).collect();
        self.engine.delete(collection, &ids).await?;
        Ok(ids.len())
    }

    /// Remove the collection and all its entries. Missing collection is a
    /// no-op.
    pub async fn clear(&self, collection: &str) -> Result<()> {
        self.engine.drop_collection(collection).await
    }

    /// Deduplicated `(document_name, folder_name)` pairs, optionally scoped
    /// to one folder. One document maps to many chunks, so the pair itself
    /// is the dedup key.
    pub async fn list_documents(
        &self,
        collection: &str,
        folder: Option<&str>,
    ) -> Result<Vec<DocumentListing>> {
        let filter = folder.map(EntryFilter::by_folder);
        let entries = self.engine.get(collection, filter.as_ref()).await?;

        let mut seen = HashSet::new();
        let mut listings = Vec::new();
        for entry in entries {
            let Some(document_name) = entry.metadata.get("document_name") else {
                continue;
            };
            let folder_name = entry.metadata.get("folder_name").cloned();
            let key = (document_name.clone(), folder_name.clone());
            if seen.insert(key) {
                listings.push(DocumentListing {
                    document_name: document_name.clone(),
                    folder_name,
                });
            }
        }
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteEngine;
    use docvault_embed::FallbackEmbedder;

    fn test_store(dir: &std::path::Path) -> DocumentStore {
        let engine = SqliteEngine::open(dir, Arc::new(FallbackEmbedder::new(32))).unwrap();
        DocumentStore::new(Arc::new(engine))
    }

    fn meta(document: &str, folder: Option<&str>) -> HashMap<String, String> {
        let mut m = HashMap::from([("document_name".to_string(), document.to_string())]);
        if let Some(f) = folder {
            m.insert("folder_name".to_string(), f.to_string());
        }
        m
    }

    #[test]
    fn test_collection_naming() {
        assert_eq!(collection_for_user("alice"), "user_alice_docs");
        assert_eq!(collection_for_user("a b/c"), "user_a_b_c_docs");
    }

    #[test]
    fn test_document_ids() {
        assert_eq!(document_id_for_file("report.v2.pdf"), "report_v2_pdf");
        // MD5 is hex-encoded and stable.
        let id = document_id_for_url("https://example.com/page");
        assert_eq!(id.len(), 32);
        assert_eq!(id, document_id_for_url("https://example.com/page"));
    }

    #[tokio::test]
    async fn test_reingestion_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let chunks = vec!["chunk one".to_string(), "chunk two".to_string()];

        store
            .upsert_chunks("c", "report_pdf", &chunks, &meta("report.pdf", None))
            .await
            .unwrap();
        store
            .upsert_chunks("c", "report_pdf", &chunks, &meta("report.pdf", None))
            .await
            .unwrap();

        assert_eq!(store.engine().count("c").await.unwrap(), 2);
        let ids: Vec<String> = store
            .get("c", None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["report_pdf_doc_0", "report_pdf_doc_1"]);
    }

    #[tokio::test]
    async fn test_delete_document_leaves_others() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        store
            .upsert_chunks(
                "c",
                "report_pdf",
                &["report body".to_string()],
                &meta("report.pdf", None),
            )
            .await
            .unwrap();
        store
            .upsert_chunks(
                "c",
                "notes_txt",
                &["notes body".to_string()],
                &meta("notes.txt", None),
            )
            .await
            .unwrap();

        let removed = store.delete_document("c", "report.pdf").await.unwrap();
        assert_eq!(removed, 1);

        let remaining = store.get("c", None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            remaining[0].metadata.get("document_name").unwrap(),
            "notes.txt"
        );

        // notes.txt chunks stay queryable.
        let matches = store.engine().query("c", "notes body", 1).await.unwrap();
        assert_eq!(matches[0].document, "notes body");
    }

    #[tokio::test]
    async fn test_delete_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let err = store.delete_document("c", "ghost.txt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_folder_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        store
            .upsert_chunks(
                "c",
                "a_txt",
                &["folder content".to_string()],
                &meta("a.txt", Some("work")),
            )
            .await
            .unwrap();

        assert_eq!(store.delete_folder("c", "work").await.unwrap(), 1);
        // Second deletion matches nothing and still succeeds.
        assert_eq!(store.delete_folder("c", "work").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_documents_dedups_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        store
            .upsert_chunks(
                "c",
                "a_txt",
                &["p1".to_string(), "p2".to_string(), "p3".to_string()],
                &meta("a.txt", Some("work")),
            )
            .await
            .unwrap();
        store
            .upsert_chunks(
                "c",
                "b_txt",
                &["q1".to_string()],
                &meta("b.txt", None),
            )
            .await
            .unwrap();

        let all = store.list_documents("c", None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].document_name, "a.txt");
        assert_eq!(all[0].folder_name.as_deref(), Some("work"));

        let scoped = store.list_documents("c", Some("work")).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].document_name, "a.txt");
    }

    #[tokio::test]
    async fn test_clear_missing_collection_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        store.clear("user_ghost_docs").await.unwrap();
    }
}
