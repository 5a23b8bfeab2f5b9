//! Ingest pipeline: documents directory -> chunks -> vector store

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppResult;
use crate::services::{DocumentProcessor, VectorStore};

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
    pub indexed: usize,
    pub store_path: String,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Rebuild the store from every PDF under `dir`.
///
/// The store is only touched after all documents parsed, so a broken PDF
/// leaves the previous index intact.
pub async fn ingest_documents(
    processor: &DocumentProcessor,
    store: &VectorStore,
    dir: &Path,
) -> AppResult<IngestReport> {
    let started = Instant::now();
    tracing::info!(dir = %dir.display(), "ingest started");

    let processed = processor.process_documents(dir)?;
    let indexed = store.rebuild(&processed.chunks).await?;

    let report = IngestReport {
        documents: processed.documents,
        pages: processed.pages,
        chunks: processed.chunks.len(),
        indexed,
        store_path: store.config().lancedb_path.clone(),
        finished_at: Utc::now(),
        duration_ms: started.elapsed().as_millis() as u64,
    };
    tracing::info!(
        documents = report.documents,
        chunks = report.chunks,
        duration_ms = report.duration_ms,
        "ingest finished"
    );
    Ok(report)
}
