//! DocVault — document ingestion and retrieval server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod routes;
mod state;
mod worker;

use state::AppState;

use docvault_embed::{Embedder, FallbackEmbedder, GeminiEmbedder};
use docvault_query::{GeminiGenerator, TextGenerator};
use docvault_store::{SqliteEngine, VectorEngine};

fn resolve_data_dir() -> PathBuf {
    std::env::var("DOCVAULT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = docvault_core::DocVaultConfig::from_env(&data_dir)?;
    let port = config.port;

    let http_client = reqwest::Client::new();

    let embedder: Arc<dyn Embedder> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiEmbedder::new(
            http_client.clone(),
            key.clone(),
            config.embedding_model.clone(),
            config.embedding_dimension,
        )),
        None => {
            warn!("GOOGLE_GEMINI_API_KEY not set; embeddings run in deterministic fallback mode");
            Arc::new(FallbackEmbedder::new(config.embedding_dimension))
        }
    };

    let engine: Arc<dyn VectorEngine> = Arc::new(SqliteEngine::open(
        &config.data_paths.vectordb,
        embedder,
    )?);

    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiGenerator::new(
        http_client,
        config.gemini_api_key.clone().unwrap_or_default(),
        config.generation_model.clone(),
    ));

    let state = Arc::new(AppState::new(config, engine, generator));

    // Start the background ingestion queue
    worker::start_ingest_worker(state.clone());

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("DocVault server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("DocVault server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
