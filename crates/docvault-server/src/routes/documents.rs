//! Document upload route — accepts multipart files and queues background
//! ingestion. One broken file never aborts the batch; every file gets its
//! own result entry.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::{AppState, IngestJob, IngestRequest};
use docvault_store::collection_for_user;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/documents/upload", post(upload_documents))
}

#[derive(Deserialize)]
struct UploadParams {
    username: String,
    folder: Option<String>,
}

/// POST /api/documents/upload?username=… — save each file and queue an
/// ingestion job, responding immediately with per-file status.
async fn upload_documents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Json<serde_json::Value> {
    let collection = collection_for_user(&params.username);
    let mut accepted = Vec::new();
    let mut errors = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let safe_filename = sanitize_filename(&filename);

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                errors.push(serde_json::json!({
                    "filename": safe_filename,
                    "status": "error",
                    "error": format!("Read failed: {}", e),
                }));
                continue;
            }
        };

        let path = state.config.data_paths.uploads.join(&safe_filename);
        if let Err(e) = std::fs::write(&path, &bytes) {
            errors.push(serde_json::json!({
                "filename": safe_filename,
                "status": "error",
                "error": format!("Write failed: {}", e),
            }));
            continue;
        }

        let job_id = uuid::Uuid::new_v4().to_string();
        let job = IngestJob::queued(job_id.clone(), safe_filename.clone(), collection.clone());
        state.enqueue_job(
            job,
            IngestRequest::File {
                job_id: job_id.clone(),
                path,
                collection: collection.clone(),
                folder: params.folder.clone(),
            },
        );

        accepted.push(serde_json::json!({
            "filename": safe_filename,
            "status": "processing",
            "jobId": job_id,
        }));
    }

    Json(serde_json::json!({
        "accepted": accepted.len(),
        "errors": errors.len(),
        "results": accepted,
        "errorDetails": errors,
    }))
}

/// Sanitize a filename to prevent path traversal.
fn sanitize_filename(name: &str) -> String {
    let name = name.replace('/', "").replace('\\', "").replace("..", "");

    std::path::Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string()
}
