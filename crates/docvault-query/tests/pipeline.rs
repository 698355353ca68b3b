//! End-to-end pipeline tests: file → chunks → store → retrieval → answer.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use docvault_embed::FallbackEmbedder;
use docvault_ingest::{BuiltinPartitioner, Ingester};
use docvault_query::{
    answer, retrieve, AnswerMode, RetrievalScope, TextGenerator, NO_DOCUMENTS_MESSAGE,
};
use docvault_store::{collection_for_user, DocumentStore, SqliteEngine, VectorEngine};

struct CountingGenerator {
    calls: Mutex<u32>,
}

impl CountingGenerator {
    fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl TextGenerator for CountingGenerator {
    async fn generate(&self, _prompt: &str) -> docvault_core::Result<String> {
        *self.calls.lock() += 1;
        Ok("model answer".to_string())
    }
}

fn setup(dir: &std::path::Path) -> (Arc<dyn VectorEngine>, DocumentStore, Ingester) {
    let engine: Arc<dyn VectorEngine> =
        Arc::new(SqliteEngine::open(dir, Arc::new(FallbackEmbedder::new(64))).unwrap());
    let store = DocumentStore::new(engine.clone());
    let ingester = Ingester::new(store.clone(), Arc::new(BuiltinPartitioner));
    (engine, store, ingester)
}

#[tokio::test]
async fn test_ingest_then_retrieve_grounds_strict_answer() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _store, ingester) = setup(dir.path());

    let file = dir.path().join("facts.txt");
    std::fs::write(
        &file,
        "The warehouse opens at six in the morning.\n\nDeliveries arrive on Tuesdays.",
    )
    .unwrap();

    let collection = collection_for_user("alice");
    let stored = ingester.ingest_file(&file, &collection, None).await.unwrap();
    assert!(stored >= 1);

    let chunks = retrieve(
        &engine,
        "The warehouse opens at six in the morning.\n\nDeliveries arrive on Tuesdays.",
        &RetrievalScope::Collection(collection),
        None,
    )
    .await
    .unwrap();
    assert!(!chunks.is_empty());

    let generator = CountingGenerator::new();
    let response = answer("when does it open?", &chunks, AnswerMode::Strict, &generator).await;

    assert!(response.contains("when does it open?"));
    assert!(response.contains("warehouse opens at six"));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_empty_store_yields_literal_no_documents_response() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _store, _ingester) = setup(dir.path());

    let chunks = retrieve(&engine, "anything at all", &RetrievalScope::All, None)
        .await
        .unwrap();
    assert!(chunks.is_empty());

    let generator = CountingGenerator::new();
    let response = answer("anything at all", &chunks, AnswerMode::Comprehensive, &generator).await;

    assert_eq!(response, NO_DOCUMENTS_MESSAGE);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_comprehensive_mode_calls_generator_once() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _store, ingester) = setup(dir.path());

    let mut metadata = HashMap::new();
    metadata.insert("document_name".to_string(), "inline.txt".to_string());
    ingester
        .ingest_text("grounding material", "inline_txt", metadata, "c")
        .await
        .unwrap();

    let chunks = retrieve(
        &engine,
        "grounding material",
        &RetrievalScope::Collection("c".to_string()),
        None,
    )
    .await
    .unwrap();

    let generator = CountingGenerator::new();
    let response = answer("question", &chunks, AnswerMode::Comprehensive, &generator).await;

    assert_eq!(response, "model answer");
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_document_deletion_is_scoped() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, store, ingester) = setup(dir.path());

    for (name, body) in [
        ("report.pdf", "quarterly figures improved"),
        ("notes.txt", "meeting notes for the offsite"),
    ] {
        let mut metadata = HashMap::new();
        metadata.insert("document_name".to_string(), name.to_string());
        ingester
            .ingest_text(body, &name.replace('.', "_"), metadata, "c")
            .await
            .unwrap();
    }

    store.delete_document("c", "report.pdf").await.unwrap();

    let chunks = retrieve(
        &engine,
        "meeting notes for the offsite",
        &RetrievalScope::Collection("c".to_string()),
        None,
    )
    .await
    .unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "meeting notes for the offsite");
}
