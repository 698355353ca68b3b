//! Chat route — retrieval-grounded answering over one collection or all
//! of them.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use docvault_query::{answer, retrieve, AnswerMode, RetrievalScope};
use docvault_store::{collection_for_user, EntryFilter};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

#[derive(Deserialize)]
struct ChatRequest {
    query: String,
    /// A username, or "all" (also the default) for every collection.
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    mode: AnswerMode,
    folder_name: Option<String>,
    document_name: Option<String>,
}

/// POST /api/chat — retrieve grounding chunks, then answer in the
/// requested mode.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let scope = match req.username.as_deref() {
        None => RetrievalScope::All,
        Some(u) if u.eq_ignore_ascii_case("all") => RetrievalScope::All,
        Some(u) => RetrievalScope::Collection(collection_for_user(u)),
    };

    let filter = EntryFilter {
        document_name: req.document_name.clone(),
        folder_name: req.folder_name.clone(),
    };
    let filter = (!filter.is_empty()).then_some(filter);

    let chunks = match retrieve(&state.engine, &req.query, &scope, filter.as_ref()).await {
        Ok(chunks) => chunks,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            );
        }
    };

    let response = answer(&req.query, &chunks, req.mode, state.generator.as_ref()).await;

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "response": response,
            "retrieved": chunks.len(),
        })),
    )
}
