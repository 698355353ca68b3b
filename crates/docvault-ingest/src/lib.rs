//! DocVault Ingest — text extraction, chunking, and the document
//! ingestion pipeline.

pub mod chunking;
pub mod extract;
pub mod ingest;
pub mod partition;

pub use chunking::{chunk_text, DEFAULT_MAX_CHUNK_SIZE};
pub use extract::extract_text;
pub use ingest::Ingester;
pub use partition::{BuiltinPartitioner, DocumentPartitioner};
