//! Health/status route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::{AppState, JobStatus};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

/// GET /api/status — service health and store summary.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let collections = state.engine.list_collections().await.unwrap_or_default();
    let jobs = state.jobs.read();
    let pending = jobs
        .values()
        .filter(|j| j.status == JobStatus::Queued || j.status == JobStatus::Running)
        .count();

    Json(serde_json::json!({
        "status": "healthy",
        "service": "docvault",
        "collections": collections.len(),
        "embeddingDimension": state.config.embedding_dimension,
        "pendingJobs": pending,
    }))
}
