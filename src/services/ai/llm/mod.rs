mod gemini;
mod ollama;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppResult, ResultExt};
use crate::services::{LlmConfig, LlmProvider};

use super::types::Generation;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

/// Text completion backend used by the retrieval chain.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// `provider/model`, for logs and the UI
    fn name(&self) -> String;

    async fn generate(&self, prompt: &str) -> AppResult<Generation>;

    /// Cheap reachability probe; does not run a completion.
    async fn health_check(&self) -> AppResult<()>;
}

pub fn build_language_model(config: &LlmConfig) -> AppResult<Arc<dyn LanguageModel>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .build()
        .config_err("failed to build http client")?;

    let model: Arc<dyn LanguageModel> = match config.provider {
        LlmProvider::Ollama => Arc::new(OllamaClient::new(client, config)),
        LlmProvider::Gemini => Arc::new(GeminiClient::new(client, config)?),
    };
    tracing::info!(model = %model.name(), "language model configured");
    Ok(model)
}

fn build_base_url(base_url: Option<&str>, default: &str) -> String {
    let base = base_url.unwrap_or(default).trim().trim_end_matches('/');
    if base.is_empty() {
        default.to_string()
    } else {
        base.to_string()
    }
}
