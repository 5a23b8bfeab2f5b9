use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::services::{ingest_documents, load_embedder, DocumentProcessor, VectorStore};

use super::{banner, load_config};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Documents directory (overrides configuration)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Drop the existing store first, e.g. after switching embedding model
    #[arg(long)]
    pub recreate: bool,
}

pub async fn run(config_path: &Path, args: IngestArgs) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = args.dir {
        config.documents_dir = dir.to_string_lossy().to_string();
    }

    banner("DOCUMENT INGESTION PIPELINE");
    println!("Documents: {}", config.documents_dir);
    println!("Vector store: {}", config.vector_config.lancedb_path);

    if args.recreate {
        VectorStore::destroy(&config.vector_config)?;
    }

    let processor = DocumentProcessor::new(&config.vector_config)?;
    let embedder = load_embedder(&config.vector_config).await?;
    let store = VectorStore::open_or_create(config.vector_config.clone(), embedder).await?;

    let report = ingest_documents(&processor, &store, Path::new(&config.documents_dir)).await?;

    banner("✓ INGESTION COMPLETE");
    println!(
        "Indexed {} document chunks from {} PDF(s), {} page(s) in {} ms",
        report.indexed, report.documents, report.pages, report.duration_ms
    );
    println!("Vector store saved to: {}", report.store_path);
    println!("\nYou can now run: docqa serve");
    Ok(())
}
