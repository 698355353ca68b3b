//! DocVault Store — vector engine contract, SQLite-backed engine, and the
//! collection-scoped document store adapter.

pub mod adapter;
pub mod engine;
pub mod sqlite;
pub mod types;

pub use adapter::{
    collection_for_user, document_id_for_file, document_id_for_url, DocumentStore,
};
pub use engine::VectorEngine;
pub use sqlite::SqliteEngine;
pub use types::{DocumentListing, EngineEntry, EngineMatch, EntryFilter};
