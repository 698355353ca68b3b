//! Collection management routes — listing, document enumeration, and
//! deletion by document, folder, or whole collection.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use docvault_store::collection_for_user;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/collections", get(list_collections))
        .route("/collections/{username}", delete(clear_collection))
        .route(
            "/collections/{username}/documents",
            get(list_documents),
        )
        .route(
            "/collections/{username}/documents/{document_name}",
            delete(delete_document),
        )
        .route(
            "/collections/{username}/folders/{folder_name}",
            delete(delete_folder),
        )
}

/// GET /api/collections — all collection names.
async fn list_collections(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.list_collections().await {
        Ok(collections) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "collections": collections,
                "total": collections.len(),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

#[derive(Deserialize)]
struct ListDocumentsQuery {
    folder: Option<String>,
}

/// GET /api/collections/:username/documents — deduplicated
/// (document, folder) pairs, optionally scoped to one folder.
async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(params): Query<ListDocumentsQuery>,
) -> impl IntoResponse {
    let collection = collection_for_user(&username);
    match state
        .store
        .list_documents(&collection, params.folder.as_deref())
        .await
    {
        Ok(documents) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "documents": documents,
                "total": documents.len(),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

/// DELETE /api/collections/:username/documents/:document_name — remove
/// exactly the chunks of one document. Missing document is a 404.
async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path((username, document_name)): Path<(String, String)>,
) -> impl IntoResponse {
    let collection = collection_for_user(&username);
    match state.store.delete_document(&collection, &document_name).await {
        Ok(removed) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "deleted": true,
                "document": document_name,
                "chunksRemoved": removed,
            })),
        ),
        Err(docvault_core::Error::NotFound(msg)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": msg })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

/// DELETE /api/collections/:username/folders/:folder_name — idempotent;
/// an empty folder deletes successfully with zero removals.
async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Path((username, folder_name)): Path<(String, String)>,
) -> impl IntoResponse {
    let collection = collection_for_user(&username);
    match state.store.delete_folder(&collection, &folder_name).await {
        Ok(removed) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "deleted": true,
                "folder": folder_name,
                "chunksRemoved": removed,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

/// DELETE /api/collections/:username — drop the whole collection.
async fn clear_collection(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    let collection = collection_for_user(&username);
    match state.store.clear(&collection).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "cleared": true, "collection": collection })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}
