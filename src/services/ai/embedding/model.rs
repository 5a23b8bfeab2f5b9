//! Embedder trait and the fastembed implementation

use std::path::PathBuf;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult, ResultExt};
use crate::services::VectorConfig;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// One vector per input, in input order
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("query text is empty".to_string()));
        }
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::AiService("query embedding missing".to_string()))
    }
}

pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedder {
    pub fn new(config: &VectorConfig) -> AppResult<Self> {
        let (model, dimension) = resolve_model(&config.embedding_model)?;

        let mut options = TextInitOptions::new(model).with_show_download_progress(true);
        if let Some(cache_dir) = config.model_cache_dir.as_deref() {
            options = options.with_cache_dir(PathBuf::from(cache_dir));
        }

        let embedding = TextEmbedding::try_new(options).ai_err("failed to load embedding model")?;
        tracing::info!(model = %config.embedding_model, dimension, "embedding model loaded");

        Ok(Self {
            model: Mutex::new(embedding),
            model_name: config.embedding_model.clone(),
            dimension,
        })
    }
}

/// Looks a model up by its hub code (`Qdrant/all-MiniLM-L6-v2-onnx`) or its
/// enum name (`AllMiniLML6V2`). Returns the model and its vector size.
fn resolve_model(name: &str) -> AppResult<(EmbeddingModel, usize)> {
    let name = name.trim();
    TextEmbedding::list_supported_models()
        .into_iter()
        .find(|info| {
            info.model_code.eq_ignore_ascii_case(name)
                || format!("{:?}", info.model).eq_ignore_ascii_case(name)
        })
        .map(|info| (info.model, info.dim))
        .ok_or_else(|| AppError::Config(format!("unknown embedding model {name}")))
}

#[async_trait]
impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self.model.lock().await;
        let vectors = model.embed(texts, None).ai_err("embedding failed")?;
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::HashEmbedder;

    #[tokio::test]
    async fn embed_query_rejects_blank_text() {
        let embedder = HashEmbedder::new(16);
        let err = embedder.embed_query("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn embed_query_returns_single_vector() {
        let embedder = HashEmbedder::new(16);
        let vector = embedder.embed_query("fog horn").await.unwrap();
        assert_eq!(vector.len(), 16);
    }

    #[test]
    fn dimension_comes_from_model_metadata() {
        let (_, dim) = resolve_model("Qdrant/all-MiniLM-L6-v2-onnx").unwrap();
        assert_eq!(dim, 384);
        let (_, dim) = resolve_model("allminilml6v2").unwrap();
        assert_eq!(dim, 384);
        let (_, dim) = resolve_model("Xenova/bge-base-en-v1.5").unwrap();
        assert_eq!(dim, 768);
    }

    #[test]
    fn unknown_model_is_a_config_error() {
        let config = VectorConfig {
            embedding_model: "nobody/no-such-model".to_string(),
            ..VectorConfig::default()
        };
        let err = FastEmbedder::new(&config).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}
