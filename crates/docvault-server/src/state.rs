//! Shared application state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use docvault_core::DocVaultConfig;
use docvault_ingest::{BuiltinPartitioner, Ingester};
use docvault_query::TextGenerator;
use docvault_store::{DocumentStore, VectorEngine};
use docvault_web::WebFetcher;

/// Ingestion job lifecycle: queued → running → completed | failed.
/// Failure is terminal; there is no cancellation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// A tracked background ingestion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestJob {
    pub id: String,
    /// File name or URL being ingested.
    pub source: String,
    pub collection: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_stored: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub queued_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl IngestJob {
    pub fn queued(id: String, source: String, collection: String) -> Self {
        Self {
            id,
            source,
            collection,
            status: JobStatus::Queued,
            chunks_stored: None,
            error: None,
            queued_at: now_millis(),
            started_at: None,
            completed_at: None,
        }
    }
}

/// A unit of background ingestion work.
pub enum IngestRequest {
    File {
        job_id: String,
        path: PathBuf,
        collection: String,
        folder: Option<String>,
    },
    Url {
        job_id: String,
        url: String,
        collection: String,
        folder: Option<String>,
        follow_links: bool,
        max_links: usize,
    },
}

impl IngestRequest {
    pub fn job_id(&self) -> &str {
        match self {
            IngestRequest::File { job_id, .. } => job_id,
            IngestRequest::Url { job_id, .. } => job_id,
        }
    }
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: DocVaultConfig,
    pub engine: Arc<dyn VectorEngine>,
    pub store: DocumentStore,
    pub ingester: Ingester,
    pub fetcher: WebFetcher,
    pub generator: Arc<dyn TextGenerator>,
    pub jobs: RwLock<HashMap<String, IngestJob>>,
    job_tx: mpsc::UnboundedSender<IngestRequest>,
    job_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<IngestRequest>>>,
}

impl AppState {
    pub fn new(
        config: DocVaultConfig,
        engine: Arc<dyn VectorEngine>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = DocumentStore::new(engine.clone());
        let ingester = Ingester::new(store.clone(), Arc::new(BuiltinPartitioner));

        Self {
            config,
            engine,
            store,
            ingester,
            fetcher: WebFetcher::new(),
            generator,
            jobs: RwLock::new(HashMap::new()),
            job_tx: tx,
            job_rx: parking_lot::Mutex::new(Some(rx)),
        }
    }

    /// Take the job receiver (can only be called once, by the worker).
    pub fn take_job_rx(&self) -> Option<mpsc::UnboundedReceiver<IngestRequest>> {
        self.job_rx.lock().take()
    }

    /// Record a job and hand it to the background worker.
    pub fn enqueue_job(&self, job: IngestJob, request: IngestRequest) {
        self.jobs.write().insert(job.id.clone(), job);
        let _ = self.job_tx.send(request);
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
