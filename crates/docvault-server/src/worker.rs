//! Background ingestion worker — drains the job queue one request at a
//! time. Submitters get an immediate "processing" acknowledgment; outcomes
//! are visible through the job map and the collection contents.

use std::sync::Arc;

use tracing::{error, info};

use docvault_core::Result;
use docvault_store::document_id_for_url;

use crate::state::{now_millis, AppState, IngestRequest, JobStatus};

/// Start the background ingest worker task.
pub fn start_ingest_worker(state: Arc<AppState>) {
    let mut rx = match state.take_job_rx() {
        Some(rx) => rx,
        None => {
            error!("Ingest worker already started");
            return;
        }
    };

    tokio::spawn(async move {
        info!("Background ingest worker started");
        while let Some(request) = rx.recv().await {
            process_request(&state, request).await;
        }
    });
}

async fn process_request(state: &AppState, request: IngestRequest) {
    let job_id = request.job_id().to_string();

    {
        let mut jobs = state.jobs.write();
        if let Some(job) = jobs.get_mut(&job_id) {
            job.status = JobStatus::Running;
            job.started_at = Some(now_millis());
        }
    }

    let outcome = match request {
        IngestRequest::File {
            path,
            collection,
            folder,
            ..
        } => {
            info!("Ingesting file {} into '{}'", path.display(), collection);
            state
                .ingester
                .ingest_file(&path, &collection, folder.as_deref())
                .await
        }
        IngestRequest::Url {
            url,
            collection,
            folder,
            follow_links,
            max_links,
            ..
        } => {
            info!("Ingesting URL {} into '{}'", url, collection);
            ingest_url(state, &url, &collection, folder.as_deref(), follow_links, max_links).await
        }
    };

    let mut jobs = state.jobs.write();
    let Some(job) = jobs.get_mut(&job_id) else {
        return;
    };
    job.completed_at = Some(now_millis());
    match outcome {
        Ok(chunks) => {
            job.status = JobStatus::Completed;
            job.chunks_stored = Some(chunks);
        }
        Err(e) => {
            error!("Ingest job {} failed: {}", job_id, e);
            job.status = JobStatus::Failed;
            job.error = Some(e.to_string());
        }
    }
}

async fn ingest_url(
    state: &AppState,
    url: &str,
    collection: &str,
    folder: Option<&str>,
    follow_links: bool,
    max_links: usize,
) -> Result<usize> {
    let page = if follow_links {
        state.fetcher.fetch_with_links(url, max_links).await?
    } else {
        state.fetcher.fetch(url).await?
    };

    let mut metadata = page.metadata.clone();
    metadata
        .entry("document_name".to_string())
        .or_insert_with(|| page.title().to_string());
    if let Some(folder) = folder {
        metadata.insert("folder_name".to_string(), folder.to_string());
    }

    state
        .ingester
        .ingest_text(&page.text, &document_id_for_url(url), metadata, collection)
        .await
}
