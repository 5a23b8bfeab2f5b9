mod chain;
mod embedding;
mod llm;
mod types;

use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::services::{AppConfig, RetrievalConfig, VectorConfig};

pub use chain::{format_sources, RagChain};
pub use embedding::{compute_embedding_hash, Embedder, FastEmbedder, SearchResult, VectorStore};
pub use llm::{build_language_model, GeminiClient, LanguageModel, OllamaClient};
pub use types::*;

/// Everything the query side needs, wired from one config.
#[derive(Clone)]
pub struct AiServices {
    pub store: Arc<VectorStore>,
    pub llm: Arc<dyn LanguageModel>,
    pub chain: Arc<RagChain>,
}

impl AiServices {
    /// Opens the existing vector store; fails if nothing was ingested yet.
    pub async fn new(config: &AppConfig) -> AppResult<Self> {
        let embedder = load_embedder(&config.vector_config).await?;
        let store = Arc::new(VectorStore::open(config.vector_config.clone(), embedder).await?);
        let llm = build_language_model(&config.llm)?;
        Ok(Self::from_parts(store, llm, config.retrieval.clone()))
    }

    pub fn from_parts(
        store: Arc<VectorStore>,
        llm: Arc<dyn LanguageModel>,
        retrieval: RetrievalConfig,
    ) -> Self {
        let chain = Arc::new(RagChain::new(store.clone(), llm.clone(), retrieval));
        Self { store, llm, chain }
    }
}

/// Load the fastembed model off the async runtime; the first run downloads it.
pub async fn load_embedder(config: &VectorConfig) -> AppResult<Arc<dyn Embedder>> {
    let config = config.clone();
    let embedder = tokio::task::spawn_blocking(move || FastEmbedder::new(&config))
        .await
        .map_err(|e| AppError::AiService(format!("embedding model loader panicked: {e}")))??;
    Ok(Arc::new(embedder))
}
