//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default embedding vector length (Gemini text-embedding-004).
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;
/// Default remote embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
/// Default remote generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash";

/// Paths to all DocVault data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Vector database directory (`data/vectordb/`).
    pub vectordb: PathBuf,
    /// File uploads directory (`data/uploads/`).
    pub uploads: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            vectordb: root.join("vectordb"),
            uploads: root.join("uploads"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.vectordb)?;
        std::fs::create_dir_all(&self.uploads)?;
        Ok(())
    }
}

/// Top-level DocVault configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocVaultConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Embedding vector length; remote vectors are padded/truncated to this.
    pub embedding_dimension: usize,
    /// Remote embedding model name.
    pub embedding_model: String,
    /// Remote generation model name.
    pub generation_model: String,
    /// Gemini API key. When absent, embedding runs in deterministic
    /// fallback mode and generation returns the degraded-service message.
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
}

impl DocVaultConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3040);

        let embedding_dimension = std::env::var("EMBEDDING_DIMENSION")
            .ok()
            .and_then(|d| d.parse().ok())
            .unwrap_or(DEFAULT_EMBEDDING_DIMENSION);

        let embedding_model = std::env::var("EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());

        let generation_model = std::env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| DEFAULT_GENERATION_MODEL.to_string());

        let gemini_api_key = std::env::var("GOOGLE_GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            embedding_dimension,
            embedding_model,
            generation_model,
            gemini_api_key,
        })
    }
}
