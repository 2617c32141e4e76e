//! OpenAI-compatible text-completion transport (`/v1/completions`)
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::{CompletionRequest, CompletionTransport};
use crate::error::AssistantError;
use crate::Result;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiTransport {
    client: Client,
    endpoint: String,
    model: String,
}

impl OpenAiTransport {
    pub fn new(base_url: Option<String>, model: String) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            endpoint: format!("{}/v1/completions", base.trim_end_matches('/')),
            model,
        })
    }
}

#[async_trait]
impl CompletionTransport for OpenAiTransport {
    fn provider(&self) -> &'static str {
        "openai"
    }

    async fn send(&self, api_key: &str, request: &CompletionRequest) -> Result<String> {
        let body = OpenAiRequest {
            model: &self.model,
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stop: &request.stop,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI request failed: {}", e);
                AssistantError::LlmError(format!("OpenAI request error: {}", e))
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let detail = response.text().await.unwrap_or_default();
            return Err(AssistantError::RateLimited(detail));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(%status, "OpenAI error response: {}", detail);
            return Err(AssistantError::LlmError(format!(
                "OpenAI returned {}: {}",
                status, detail
            )));
        }

        let parsed: OpenAiResponse = response.json().await.map_err(|e| {
            AssistantError::LlmError(format!("OpenAI parse error: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| AssistantError::LlmError("No choices in OpenAI response".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "no_stop")]
    stop: &'a [String],
}

fn no_stop(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    text: String,
}
