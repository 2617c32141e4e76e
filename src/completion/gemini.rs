//! Gemini `generateContent` transport
//!
//! The prompt is sent as a single user turn; sampling parameters map onto
//! `generation_config`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::{CompletionRequest, CompletionTransport};
use crate::error::AssistantError;
use crate::Result;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Reusable Gemini transport (connection-pooled)
pub struct GeminiTransport {
    client: Client,
    endpoint: String,
}

impl GeminiTransport {
    pub fn new(base_url: Option<String>, model: String) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                base.trim_end_matches('/'),
                model
            ),
        })
    }
}

#[async_trait]
impl CompletionTransport for GeminiTransport {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    async fn send(&self, api_key: &str, request: &CompletionRequest) -> Result<String> {
        let body = GeminiRequest::from_completion(request);

        let url = format!("{}?key={}", self.endpoint, api_key);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                AssistantError::LlmError(format!("Gemini API error: {}", e))
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let detail = response.text().await.unwrap_or_default();
            return Err(AssistantError::RateLimited(detail));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", detail);
            return Err(AssistantError::LlmError(format!("Gemini API error: {}", detail)));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            AssistantError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        gemini_response.first_text()
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GeminiRequest {
    fn from_completion(request: &CompletionRequest) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
                max_output_tokens: request.max_tokens,
                stop_sequences: request.stop.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

impl GeminiResponse {
    fn first_text(self) -> Result<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::LlmError("No response from Gemini API".to_string()))?;

        candidate
            .content
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
            .ok_or_else(|| AssistantError::LlmError("Empty response from Gemini".to_string()))
    }
}
