//! Scripted completion client for development & testing
//!
//! Keeps the pipeline runnable without a provider. Rules map a prompt
//! substring ("needle") to a canned completion; the first matching rule wins.
//! Prompts no rule matches are served from a FIFO queue.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{CompletionClient, CompletionRequest};
use crate::error::AssistantError;
use crate::Result;

#[derive(Default)]
pub struct MockCompletionClient {
    rules: Vec<(String, String)>,
    queue: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, needle: impl Into<String>, completion: impl Into<String>) -> Self {
        self.rules.push((needle.into(), completion.into()));
        self
    }

    pub fn with_fallback(mut self, completion: impl Into<String>) -> Self {
        self.queue.get_mut().push_back(completion.into());
        self
    }

    /// Every request seen so far, in call order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        request.validate()?;
        self.requests.lock().await.push(request.clone());

        if let Some((needle, completion)) = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
        {
            debug!(needle = %needle, "Mock completion rule matched");
            return Ok(completion.clone());
        }

        self.queue.lock().await.pop_front().ok_or_else(|| {
            AssistantError::LlmError("MockCompletionClient has no completion for prompt".to_string())
        })
    }
}
