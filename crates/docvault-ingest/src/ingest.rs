//! Document ingestion pipeline: file → text → chunks → vector store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use docvault_core::Result;
use docvault_store::{document_id_for_file, DocumentStore};

use crate::chunking::{chunk_text, DEFAULT_MAX_CHUNK_SIZE};
use crate::extract::extract_text;
use crate::partition::DocumentPartitioner;

/// Handles document ingestion: extraction, chunking, and storage.
pub struct Ingester {
    store: DocumentStore,
    partitioner: Arc<dyn DocumentPartitioner>,
    max_chunk_size: usize,
}

impl Ingester {
    pub fn new(store: DocumentStore, partitioner: Arc<dyn DocumentPartitioner>) -> Self {
        Self {
            store,
            partitioner,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }

    /// Ingest a file into `collection`. Returns the number of chunks stored.
    pub async fn ingest_file(
        &self,
        path: &Path,
        collection: &str,
        folder: Option<&str>,
    ) -> Result<usize> {
        let text = extract_text(path, self.partitioner.as_ref())?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mut metadata = HashMap::from([
            ("document_name".to_string(), file_name.clone()),
            ("source_type".to_string(), "file".to_string()),
        ]);
        if let Some(folder) = folder {
            metadata.insert("folder_name".to_string(), folder.to_string());
        }

        let document_id = document_id_for_file(&file_name);
        self.ingest_text(&text, &document_id, metadata, collection)
            .await
    }

    /// Ingest pre-extracted text (e.g., fetched web content) under a stable
    /// document identifier. `metadata` must carry `document_name`.
    pub async fn ingest_text(
        &self,
        text: &str,
        document_id: &str,
        metadata: HashMap<String, String>,
        collection: &str,
    ) -> Result<usize> {
        let chunks = chunk_text(text, self.max_chunk_size);
        let stored = self
            .store
            .upsert_chunks(collection, document_id, &chunks, &metadata)
            .await?;

        info!(
            "Ingested '{}' into '{}' as {} chunks",
            document_id, collection, stored
        );
        Ok(stored)
    }
}
