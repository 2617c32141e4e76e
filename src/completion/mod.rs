//! Completion Gateway
//!
//! The LLM is a black-box text-completion function behind `CompletionClient`.
//! Production traffic goes through `CompletionGateway`, which adds key
//! rotation, rate-limit retry and memoization on top of a provider
//! `CompletionTransport`.

pub mod cache;
pub mod gateway;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use cache::CompletionCache;
pub use gateway::{CompletionGateway, KeyPool, RetryPolicy};
pub use gemini::GeminiTransport;
pub use mock::MockCompletionClient;
pub use openai::OpenAiTransport;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AssistantError;
use crate::Result;

/// One text-completion call.
///
/// Exactly one of `temperature` / `top_p` must be set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            top_p: None,
            max_tokens,
            stop: Vec::new(),
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn stop(mut self, sequence: impl Into<String>) -> Self {
        self.stop.push(sequence.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        match (self.temperature, self.top_p) {
            (Some(_), Some(_)) => Err(AssistantError::ConfigError(
                "completion request sets both temperature and top_p".to_string(),
            )),
            (None, None) => Err(AssistantError::ConfigError(
                "completion request sets neither temperature nor top_p".to_string(),
            )),
            _ if self.max_tokens == 0 => Err(AssistantError::ConfigError(
                "completion request must allow at least one token".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Memo key covering the prompt and every sampling parameter.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.prompt.as_bytes());
        hasher.update([0u8]);
        hasher.update(
            format!(
                "{:?}|{:?}|{}|{:?}",
                self.temperature, self.top_p, self.max_tokens, self.stop
            )
            .as_bytes(),
        );
        hex::encode(hasher.finalize())
    }
}

/// Anything that turns a prompt into completion text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// A single provider endpoint called with one API key.
///
/// Implementations map HTTP 429 to `AssistantError::RateLimited`.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn send(&self, api_key: &str, request: &CompletionRequest) -> Result<String>;
}
