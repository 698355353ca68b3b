//! Multi-collection similarity retrieval and ranking.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use docvault_core::Result;
use docvault_store::{EntryFilter, VectorEngine};

/// Which collections a retrieval covers.
#[derive(Debug, Clone)]
pub enum RetrievalScope {
    /// One named collection.
    Collection(String),
    /// Every collection in the store.
    All,
}

/// One ranked chunk of grounding text.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub similarity: f32,
}

/// Convert an engine-reported distance to a similarity in [0, 1].
pub fn similarity_from_distance(distance: f32) -> f32 {
    (1.0 - distance).max(0.0)
}

/// Query the scoped collections and rank all results by descending
/// similarity. Each collection is asked for its full entry count (at least
/// 1) so ranking sees whole collections, not an arbitrary top-k. The
/// collections are read-only here, so they are queried concurrently and
/// merged once all complete. A failing collection is skipped, never fatal.
pub async fn retrieve(
    engine: &Arc<dyn VectorEngine>,
    query: &str,
    scope: &RetrievalScope,
    filter: Option<&EntryFilter>,
) -> Result<Vec<RetrievedChunk>> {
    let collections = match scope {
        RetrievalScope::Collection(name) => vec![name.clone()],
        RetrievalScope::All => engine.list_collections().await?,
    };

    let queries = collections.iter().map(|collection| async move {
        let n_results = engine.count(collection).await.unwrap_or(0).max(1);
        engine.query(collection, query, n_results).await
    });
    let results = join_all(queries).await;

    let mut chunks = Vec::new();
    for (collection, result) in collections.iter().zip(results) {
        match result {
            Ok(matches) => {
                for m in matches {
                    if let Some(filter) = filter {
                        if !filter.matches(&m.metadata) {
                            continue;
                        }
                    }
                    chunks.push(RetrievedChunk {
                        text: m.document,
                        similarity: similarity_from_distance(m.distance),
                    });
                }
            }
            Err(e) => {
                warn!("Query of collection '{}' failed: {}", collection, e);
            }
        }
    }

    // Stable sort: ties keep their original collection order.
    chunks.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    Ok(chunks)
}
