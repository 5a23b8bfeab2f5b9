//! Application configuration.
//!
//! Sources are layered as defaults, then the JSON file, then environment
//! variables, then command-line flags.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, ResultExt};

pub const DEFAULT_CONFIG_FILE: &str = "docqa.json";

pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a helpful AI assistant. Use the following pieces of context to answer the question at the end.

If you don't know the answer based on the context, just say \"I don't have enough information in the provided documents to answer this question.\" Don't try to make up an answer.

Context:
{context}

Question: {question}

Helpful Answer:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Ollama,
    Gemini,
}

impl Default for LlmProvider {
    fn default() -> Self {
        LlmProvider::Ollama
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            other => Err(AppError::Config(format!("provider {other} not supported"))),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::Gemini => write!(f, "gemini"),
        }
    }
}

/// Generation model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            model: "llama3.2".to_string(),
            base_url: None,
            api_key: None,
            temperature: 0.2,
            max_tokens: 512,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkSizer {
    Characters,
    Tokens,
}

impl Default for ChunkSizer {
    fn default() -> Self {
        ChunkSizer::Characters
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub lancedb_path: String,
    pub table_name: String,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunk_sizer: ChunkSizer,
    pub embed_batch_size: usize,
    pub model_cache_dir: Option<String>,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            lancedb_path: String::new(),
            table_name: "document_qa_collection".to_string(),
            embedding_model: "Qdrant/all-MiniLM-L6-v2-onnx".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            chunk_sizer: ChunkSizer::Characters,
            embed_batch_size: 32,
            model_cache_dir: None,
        }
    }
}

impl VectorConfig {
    fn apply_defaults(&mut self, data_dir: &Path) {
        if self.lancedb_path.trim().is_empty() {
            let path = data_dir.join("vectorstore");
            self.lancedb_path = path.to_string_lossy().to_string();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub similarity_threshold: Option<f64>,
    pub prompt_template: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            similarity_threshold: None,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7860,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Top-level configuration. Empty path fields are derived from `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    pub data_dir: String,
    pub documents_dir: String,
    pub llm: LlmConfig,
    pub vector_config: VectorConfig,
    pub retrieval: RetrievalConfig,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            data_dir: "data".to_string(),
            documents_dir: String::new(),
            llm: LlmConfig::default(),
            vector_config: VectorConfig::default(),
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Fills the paths that derive from `data_dir`.
    pub fn apply_defaults(&mut self) {
        let data_dir = PathBuf::from(&self.data_dir);
        if self.documents_dir.trim().is_empty() {
            self.documents_dir = data_dir.join("documents").to_string_lossy().to_string();
        }
        self.vector_config.apply_defaults(&data_dir);
    }

    /// Applies environment overrides. `lookup` is usually `std::env::var(..).ok()`.
    ///
    /// `OLLAMA_BASE_URL` only applies to the Ollama provider; `DOCQA_LLM_BASE_URL`
    /// applies to whichever provider is selected.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("DOCQA_DATA_DIR") {
            self.data_dir = value;
        }
        if let Some(value) = get("DOCQA_DOCUMENTS_DIR") {
            self.documents_dir = value;
        }
        if let Some(value) = get("DOCQA_VECTORSTORE_DIR") {
            self.vector_config.lancedb_path = value;
        }
        if let Some(value) = get("DOCQA_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = get("DOCQA_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = get("DOCQA_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        } else if self.llm.provider == LlmProvider::Ollama {
            if let Some(value) = get("OLLAMA_BASE_URL") {
                self.llm.base_url = Some(value);
            }
        }
        if let Some(value) = get("GEMINI_API_KEY") {
            self.llm.api_key = Some(value);
        }
        if let Some(value) = get("DOCQA_TEMPERATURE") {
            self.llm.temperature = value.trim().parse().config_err("DOCQA_TEMPERATURE")?;
        }
        if let Some(value) = get("DOCQA_MAX_TOKENS") {
            self.llm.max_tokens = value.trim().parse().config_err("DOCQA_MAX_TOKENS")?;
        }
        if let Some(value) = get("DOCQA_EMBEDDING_MODEL") {
            self.vector_config.embedding_model = value;
        }
        if let Some(value) = get("DOCQA_CHUNK_SIZE") {
            self.vector_config.chunk_size = value.trim().parse().config_err("DOCQA_CHUNK_SIZE")?;
        }
        if let Some(value) = get("DOCQA_CHUNK_OVERLAP") {
            self.vector_config.chunk_overlap =
                value.trim().parse().config_err("DOCQA_CHUNK_OVERLAP")?;
        }
        if let Some(value) = get("DOCQA_TOP_K") {
            self.retrieval.top_k = value.trim().parse().config_err("DOCQA_TOP_K")?;
        }
        if let Some(value) = get("DOCQA_HOST") {
            self.server.host = value;
        }
        if let Some(value) = get("DOCQA_PORT") {
            self.server.port = value.trim().parse().config_err("DOCQA_PORT")?;
        }

        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        let vector = &self.vector_config;
        if vector.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be greater than 0".to_string()));
        }
        if vector.chunk_overlap >= vector.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                vector.chunk_overlap, vector.chunk_size
            )));
        }
        if vector.embed_batch_size == 0 {
            return Err(AppError::Config(
                "embed_batch_size must be greater than 0".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(format!(
                "temperature {} outside 0..=2",
                self.llm.temperature
            )));
        }
        let template = &self.retrieval.prompt_template;
        if !template.contains("{context}") || !template.contains("{question}") {
            return Err(AppError::Config(
                "prompt_template must contain {context} and {question}".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads and writes the JSON config file.
pub struct ConfigService {
    config_path: PathBuf,
}

impl ConfigService {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads the file, or defaults when it does not exist.
    pub fn load(&self) -> AppResult<AppConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "config file missing, using defaults");
            return Ok(AppConfig::default());
        }

        let raw = fs::read(&self.config_path)?;
        let config: AppConfig = serde_json::from_slice(&raw)
            .config_err(&format!("invalid config file {}", self.config_path.display()))?;
        Ok(config)
    }

    /// Loads the file and layers environment overrides on top.
    pub fn resolve(&self) -> AppResult<AppConfig> {
        let mut config = self.load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.apply_defaults();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> AppResult<()> {
        let json = serde_json::to_vec_pretty(config).config_err("serialize config")?;
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.config_path, json)?;
        Ok(())
    }
}
