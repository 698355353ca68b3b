//! Embedding provider trait and implementations.
//!
//! `GeminiEmbedder` calls the remote embedding API and recovers locally with
//! a deterministic hash-derived vector on any failure, so embedding never
//! surfaces an error — ingestion and queries keep working in a degraded mode
//! when the service is unreachable.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::fallback::fallback_embedding;

/// Remote payloads above this size are rejected by the API; truncate first.
pub const MAX_EMBED_CHARS: usize = 8000;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a text string into a vector of exactly `dimension()` floats.
    async fn embed(&self, text: &str) -> Vec<f32>;

    /// Embed a batch of texts.
    async fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await);
        }
        out
    }

    /// The fixed embedding vector length.
    fn dimension(&self) -> usize;
}

/// Known response shapes of the remote embedding API, tried in order.
/// The API's shape is not guaranteed stable across versions; first match wins.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    Single { embedding: EmbeddingPayload },
    Many { embeddings: Vec<EmbeddingPayload> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingPayload {
    Values { values: Vec<f32> },
    Bare(Vec<f32>),
}

impl EmbedResponse {
    fn into_vector(self) -> Option<Vec<f32>> {
        let payload = match self {
            EmbedResponse::Single { embedding } => embedding,
            EmbedResponse::Many { mut embeddings } => {
                if embeddings.is_empty() {
                    return None;
                }
                embeddings.remove(0)
            }
        };
        match payload {
            EmbeddingPayload::Values { values } => Some(values),
            EmbeddingPayload::Bare(values) => Some(values),
        }
    }
}

/// Embedder backed by the Gemini `embedContent` endpoint.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl GeminiEmbedder {
    pub fn new(client: reqwest::Client, api_key: String, model: String, dimension: usize) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            dimension,
        }
    }

    /// Point the embedder at a different API host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn embed_remote(&self, text: &str) -> docvault_core::Result<Vec<f32>> {
        let truncated: String = text.chars().take(MAX_EMBED_CHARS).collect();

        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": truncated }] },
            "taskType": "RETRIEVAL_DOCUMENT",
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| docvault_core::Error::EmbeddingService(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(docvault_core::Error::EmbeddingService(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            docvault_core::Error::EmbeddingService(format!("unexpected response shape: {}", e))
        })?;

        parsed.into_vector().ok_or_else(|| {
            docvault_core::Error::EmbeddingService("response carried no embedding".to_string())
        })
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Vec<f32> {
        match self.embed_remote(text).await {
            Ok(values) => {
                let mut values = resize_to_dimension(values, self.dimension);
                l2_normalize(&mut values);
                values
            }
            Err(e) => {
                warn!("Embedding service unavailable, using fallback: {}", e);
                fallback_embedding(text, self.dimension)
            }
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Embedder that only produces the deterministic hash-derived vectors.
/// Used when no API key is configured, and in tests.
pub struct FallbackEmbedder {
    dimension: usize,
}

impl FallbackEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for FallbackEmbedder {
    async fn embed(&self, text: &str) -> Vec<f32> {
        fallback_embedding(text, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Zero-pad or truncate to exactly `dimension` entries.
fn resize_to_dimension(mut values: Vec<f32>, dimension: usize) -> Vec<f32> {
    values.resize(dimension, 0.0);
    values
}

/// Divide every component by the Euclidean norm; a zero vector is left as-is.
fn l2_normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in values.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_shape_single_with_values() {
        let parsed: EmbedResponse =
            serde_json::from_str(r#"{"embedding": {"values": [0.1, 0.2]}}"#).unwrap();
        assert_eq!(parsed.into_vector(), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn test_shape_list_with_values() {
        let parsed: EmbedResponse =
            serde_json::from_str(r#"{"embeddings": [{"values": [0.3]}, {"values": [0.4]}]}"#)
                .unwrap();
        assert_eq!(parsed.into_vector(), Some(vec![0.3]));
    }

    #[test]
    fn test_shape_bare_mapping() {
        let parsed: EmbedResponse =
            serde_json::from_str(r#"{"embedding": [1.0, 2.0, 3.0]}"#).unwrap();
        assert_eq!(parsed.into_vector(), Some(vec![1.0, 2.0, 3.0]));

        let parsed: EmbedResponse =
            serde_json::from_str(r#"{"embeddings": [[5.0, 6.0]]}"#).unwrap();
        assert_eq!(parsed.into_vector(), Some(vec![5.0, 6.0]));
    }

    #[test]
    fn test_shape_empty_list_is_rejected() {
        let parsed: EmbedResponse = serde_json::from_str(r#"{"embeddings": []}"#).unwrap();
        assert_eq!(parsed.into_vector(), None);
    }

    #[test]
    fn test_resize_pads_and_truncates() {
        assert_eq!(resize_to_dimension(vec![1.0], 3), vec![1.0, 0.0, 0.0]);
        assert_eq!(resize_to_dimension(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
    }

    #[test]
    fn test_l2_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_remote_embedding_normalized_to_dimension() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/text-embedding-004:embedContent");
                then.status(200)
                    .json_body(serde_json::json!({"embedding": {"values": [3.0, 4.0]}}));
            })
            .await;

        let embedder = GeminiEmbedder::new(
            reqwest::Client::new(),
            "test-key".to_string(),
            "text-embedding-004".to_string(),
            4,
        )
        .with_base_url(server.base_url());

        let v = embedder.embed("some text").await;
        assert_eq!(v.len(), 4);
        // [3, 4, 0, 0] normalized → [0.6, 0.8, 0, 0]
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert_eq!(v[2], 0.0);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_deterministically() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/text-embedding-004:embedContent");
                then.status(500);
            })
            .await;

        let embedder = GeminiEmbedder::new(
            reqwest::Client::new(),
            "test-key".to_string(),
            "text-embedding-004".to_string(),
            32,
        )
        .with_base_url(server.base_url());

        let a = embedder.embed("identical input").await;
        let b = embedder.embed("identical input").await;
        assert_eq!(a.len(), 32);
        assert_eq!(a, b);
        assert_eq!(a, fallback_embedding("identical input", 32));
    }
}
