//! Grounded answer assembly.
//!
//! Strict mode frames the retrieved context without a model call;
//! comprehensive mode asks the generation service, retrying with backoff
//! before degrading to a literal failure message. An empty retrieval never
//! reaches the generation service.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::generate::TextGenerator;
use crate::retrieval::RetrievedChunk;

/// Response when retrieval finds nothing to ground on.
pub const NO_DOCUMENTS_MESSAGE: &str = "No relevant documents found in the database.";

/// Response when the generation service stays unreachable.
pub const GENERATION_FAILURE_MESSAGE: &str =
    "Unable to generate a response after multiple attempts.";

const MAX_GENERATION_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// How the grounded answer is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Return the retrieved context with instructive framing, no model call.
    Strict,
    /// Send context plus query to the generation service.
    Comprehensive,
}

impl Default for AnswerMode {
    fn default() -> Self {
        Self::Strict
    }
}

/// Call the generation service with up to three attempts and a doubling
/// backoff, degrading to [`GENERATION_FAILURE_MESSAGE`].
pub async fn generate_with_retry(generator: &dyn TextGenerator, prompt: &str) -> String {
    let mut delay = BACKOFF_BASE;
    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        match generator.generate(prompt).await {
            Ok(text) => return text,
            Err(e) => {
                warn!("Generation attempt {} failed: {}", attempt, e);
                if attempt < MAX_GENERATION_ATTEMPTS {
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }
    GENERATION_FAILURE_MESSAGE.to_string()
}

/// Assemble the caller-visible response from ranked chunks.
pub async fn answer(
    query: &str,
    chunks: &[RetrievedChunk],
    mode: AnswerMode,
    generator: &dyn TextGenerator,
) -> String {
    if chunks.is_empty() {
        return NO_DOCUMENTS_MESSAGE.to_string();
    }

    let context = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    match mode {
        AnswerMode::Strict => {
            format!(
                "Based on the following documents, answer: '{}'\n\n{}",
                query, context
            )
        }
        AnswerMode::Comprehensive => {
            let prompt = format!(
                "Here are relevant documents:\n\n{}\n\nNow answer: {}",
                context, query
            );
            generate_with_retry(generator, &prompt).await
        }
    }
}
