use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::services::{load_embedder, VectorStore};

use super::load_config;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to look up
    pub query: String,

    /// Number of chunks to return (defaults to retrieval.top_k)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub k: Option<u32>,
}

pub async fn run(config_path: &Path, args: SearchArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let k = args
        .k
        .map(|k| k as usize)
        .unwrap_or(config.retrieval.top_k);

    let embedder = load_embedder(&config.vector_config).await?;
    let store = VectorStore::open(config.vector_config.clone(), embedder).await?;
    let hits = store.query(&args.query, k).await?;

    if hits.is_empty() {
        println!("No matching chunks.");
        return Ok(());
    }
    for (idx, hit) in hits.iter().enumerate() {
        println!(
            "[{}] {:.3}  {} p.{} #{}",
            idx + 1,
            hit.score,
            hit.source,
            hit.page_number,
            hit.chunk_index
        );
        println!("    {}\n", hit.chunk_text.replace('\n', " "));
    }
    Ok(())
}
