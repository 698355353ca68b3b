//! DocVault Embed — chunk embedding with a remote provider and a
//! deterministic local fallback.

pub mod fallback;
pub mod provider;

pub use fallback::fallback_embedding;
pub use provider::{Embedder, FallbackEmbedder, GeminiEmbedder};
