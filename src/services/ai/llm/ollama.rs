use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::LlmConfig;

use super::super::types::{ChatUsage, Generation};
use super::{build_base_url, LanguageModel};

const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaClient {
    pub fn new(client: Client, config: &LlmConfig) -> Self {
        Self {
            client,
            base_url: build_base_url(config.base_url.as_deref(), DEFAULT_OLLAMA_BASE_URL),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn name(&self) -> String {
        format!("ollama/{}", self.model)
    }

    async fn generate(&self, prompt: &str) -> AppResult<Generation> {
        let request = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::AiService(format!(
                    "ollama request failed (is `ollama serve` running at {}?): {e}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AiService(format!(
                "ollama request failed: {status} {body}"
            )));
        }

        let response: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiService(format!("ollama response invalid: {e}")))?;

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (input, output) => Some(ChatUsage::new(input.unwrap_or(0), output.unwrap_or(0))),
        };

        Ok(Generation {
            text: response.response,
            usage,
        })
    }

    async fn health_check(&self) -> AppResult<()> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                AppError::AiService(format!(
                    "ollama not reachable at {} (start it with `ollama serve`): {e}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::AiService(format!(
                "ollama health check failed: {status}"
            )));
        }

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiService(format!("ollama tags response invalid: {e}")))?;

        let tagged = format!("{}:", self.model);
        let installed = tags
            .models
            .iter()
            .any(|m| m.name == self.model || m.name.starts_with(&tagged));
        if !installed {
            return Err(AppError::AiService(format!(
                "model {} is not installed in ollama; run `ollama pull {}`",
                self.model, self.model
            )));
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
    prompt_eval_count: Option<i64>,
    eval_count: Option<i64>,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Deserialize)]
struct OllamaModelTag {
    name: String,
}
