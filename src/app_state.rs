use std::sync::Arc;

use serde::Serialize;

use crate::services::{AiServices, AppConfig, RagChain};

/// Static facts shown in the web UI's system panel
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub documents_dir: String,
    pub model: String,
    pub embedding_model: String,
    pub vector_db: &'static str,
    pub vectorstore_path: String,
}

#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<RagChain>,
    pub info: Arc<SystemInfo>,
}

impl AppState {
    pub fn new(services: &AiServices, config: &AppConfig) -> Self {
        Self::from_chain(services.chain.clone(), &config.documents_dir)
    }

    pub fn from_chain(chain: Arc<RagChain>, documents_dir: &str) -> Self {
        let info = SystemInfo {
            documents_dir: documents_dir.to_string(),
            model: chain.model_name(),
            embedding_model: chain.store().embedding_model().to_string(),
            vector_db: "LanceDB",
            vectorstore_path: chain.store().config().lancedb_path.clone(),
        };
        Self {
            chain,
            info: Arc::new(info),
        }
    }
}
