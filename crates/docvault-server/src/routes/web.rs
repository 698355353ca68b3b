//! Web ingestion routes — URL submission is fire-and-forget: the request
//! returns a "processing" acknowledgment and the outcome is observable
//! through the job map and the collection contents.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::{AppState, IngestJob, IngestRequest};
use docvault_store::collection_for_user;

const DEFAULT_MAX_LINKS: usize = 5;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/web/ingest", post(ingest_url))
        .route("/web/ingest/batch", post(ingest_url_batch))
}

#[derive(Deserialize)]
struct WebIngestRequest {
    url: String,
    username: String,
    folder_name: Option<String>,
    #[serde(default)]
    follow_links: bool,
    #[serde(default = "default_max_links")]
    max_links: usize,
}

fn default_max_links() -> usize {
    DEFAULT_MAX_LINKS
}

/// POST /api/web/ingest — queue one URL for background ingestion.
async fn ingest_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WebIngestRequest>,
) -> impl IntoResponse {
    let collection = collection_for_user(&req.username);
    let job_id = queue_url_job(
        &state,
        req.url.clone(),
        collection,
        req.folder_name,
        req.follow_links,
        req.max_links,
    );

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "processing",
            "url": req.url,
            "jobId": job_id,
        })),
    )
}

#[derive(Deserialize)]
struct WebBatchRequest {
    urls: Vec<String>,
    username: String,
    folder_name: Option<String>,
    #[serde(default)]
    follow_links: bool,
    #[serde(default = "default_max_links")]
    max_links: usize,
}

/// POST /api/web/ingest/batch — one job per URL. The response has exactly
/// one entry per submitted URL; later per-URL failures land on the jobs,
/// never on each other.
async fn ingest_url_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WebBatchRequest>,
) -> impl IntoResponse {
    let collection = collection_for_user(&req.username);

    let results: Vec<serde_json::Value> = req
        .urls
        .iter()
        .map(|url| {
            let job_id = queue_url_job(
                &state,
                url.clone(),
                collection.clone(),
                req.folder_name.clone(),
                req.follow_links,
                req.max_links,
            );
            serde_json::json!({
                "url": url,
                "status": "processing",
                "jobId": job_id,
            })
        })
        .collect();

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "submitted": results.len(),
            "results": results,
        })),
    )
}

fn queue_url_job(
    state: &AppState,
    url: String,
    collection: String,
    folder: Option<String>,
    follow_links: bool,
    max_links: usize,
) -> String {
    let job_id = uuid::Uuid::new_v4().to_string();
    let job = IngestJob::queued(job_id.clone(), url.clone(), collection.clone());
    state.enqueue_job(
        job,
        IngestRequest::Url {
            job_id: job_id.clone(),
            url,
            collection,
            folder,
            follow_links,
            max_links,
        },
    );
    job_id
}
