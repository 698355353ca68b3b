//! DocVault Query — multi-collection retrieval, ranking, and grounded
//! answer assembly.

pub mod answer;
pub mod generate;
pub mod retrieval;

pub use answer::{
    answer, generate_with_retry, AnswerMode, GENERATION_FAILURE_MESSAGE, NO_DOCUMENTS_MESSAGE,
};
pub use generate::{GeminiGenerator, TextGenerator};
pub use retrieval::{retrieve, similarity_from_distance, RetrievalScope, RetrievedChunk};
