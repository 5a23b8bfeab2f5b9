use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::LlmConfig;

use super::super::types::{ChatUsage, Generation};
use super::{build_base_url, LanguageModel};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GeminiClient {
    pub fn new(client: Client, config: &LlmConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::Config("missing api key for gemini (set GEMINI_API_KEY)".to_string())
            })?;

        Ok(Self {
            client,
            base_url: build_base_url(config.base_url.as_deref(), DEFAULT_GEMINI_BASE_URL),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> String {
        format!("gemini/{}", self.model)
    }

    async fn generate(&self, prompt: &str) -> AppResult<Generation> {
        let request = GeminiGenerateRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::AiService(format!("gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AiService(format!(
                "gemini request failed: {status} {body}"
            )));
        }

        let response: GeminiGenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiService(format!("gemini response invalid: {e}")))?;

        let mut output = String::new();
        if let Some(candidate) = response.candidates.and_then(|mut list| {
            if list.is_empty() {
                None
            } else {
                Some(list.remove(0))
            }
        }) {
            if let Some(content) = candidate.content {
                for part in content.parts {
                    if let Some(text) = part.text {
                        output.push_str(&text);
                    }
                }
            }
        }

        let usage = response.usage_metadata.and_then(|metadata| {
            match (metadata.prompt_token_count, metadata.candidates_token_count) {
                (Some(input), Some(output)) => Some(ChatUsage {
                    input_tokens: input,
                    output_tokens: output,
                    total_tokens: metadata.total_token_count.unwrap_or(input + output),
                }),
                _ => None,
            }
        });

        Ok(Generation {
            text: output,
            usage,
        })
    }

    async fn health_check(&self) -> AppResult<()> {
        let url = format!("{}/v1beta/models/{}", self.base_url, self.model);
        let response = self
            .client
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::AiService(format!("gemini not reachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AiService(format!(
                "gemini model {} unavailable: {status} {body}",
                self.model
            )));
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct GeminiGenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<i64>,
    candidates_token_count: Option<i64>,
    total_token_count: Option<i64>,
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::services::LlmProvider;
    use crate::test_support::spawn_mock_server;

    type Captured = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    async fn mock_generate(
        State(captured): State<Captured>,
        Path(model_action): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let key = headers
            .get("x-goog-api-key")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        captured.lock().unwrap().push((model_action, key, body));
        Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Every thirty " }, { "text": "seconds." }] }
            }],
            "usageMetadata": { "promptTokenCount": 30, "candidatesTokenCount": 4, "totalTokenCount": 34 }
        }))
    }

    fn config(base_url: String) -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.0-flash".to_string(),
            base_url: Some(base_url),
            api_key: Some("test-key".to_string()),
            max_tokens: 256,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn generate_joins_parts_and_reads_usage() {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route("/v1beta/models/:model_action", post(mock_generate))
            .with_state(captured.clone());
        let base = spawn_mock_server(app).await;

        let client = GeminiClient::new(Client::new(), &config(base)).unwrap();
        let generation = client.generate("How often?").await.unwrap();

        assert_eq!(generation.text, "Every thirty seconds.");
        assert_eq!(
            generation.usage,
            Some(ChatUsage {
                input_tokens: 30,
                output_tokens: 4,
                total_tokens: 34
            })
        );

        let (model_action, key, body) = captured.lock().unwrap()[0].clone();
        assert_eq!(model_action, "gemini-2.0-flash:generateContent");
        assert_eq!(key.as_deref(), Some("test-key"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "How often?");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
    }

    #[tokio::test]
    async fn health_check_maps_missing_model_to_ai_error() {
        let app = Router::new().route(
            "/v1beta/models/:model",
            get(|| async { (StatusCode::NOT_FOUND, "model not found") }),
        );
        let base = spawn_mock_server(app).await;

        let client = GeminiClient::new(Client::new(), &config(base)).unwrap();
        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, AppError::AiService(msg) if msg.contains("404")));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let mut config = config("http://127.0.0.1:1".to_string());
        config.api_key = Some("   ".to_string());
        let err = GeminiClient::new(Client::new(), &config).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}
