//! Key-rotating, memoizing completion gateway
//!
//! RETRY LOOP:
//! pass 1: one attempt per key (429 → next key)
//! sleep backoff
//! pass 2: one attempt per key
//! → UpstreamExhausted
//!
//! Any error other than a 429 is returned immediately.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{
    CompletionCache, CompletionClient, CompletionRequest, CompletionTransport, GeminiTransport,
    OpenAiTransport,
};
use crate::config::{AppConfig, ProviderKind};
use crate::error::AssistantError;
use crate::Result;

/// Round-robin API key pool shared by every request in the process.
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyPool {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(AssistantError::ConfigError(
                "API key pool is empty".to_string(),
            ));
        }
        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn next_key(&self) -> &str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        &self.keys[index]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Full passes over the key pool before giving up.
    pub passes: usize,
    /// Sleep between passes.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            passes: 2,
            backoff: Duration::from_secs(5),
        }
    }
}

pub struct CompletionGateway {
    transport: Arc<dyn CompletionTransport>,
    keys: KeyPool,
    policy: RetryPolicy,
    cache: CompletionCache,
}

impl CompletionGateway {
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        keys: KeyPool,
        policy: RetryPolicy,
        cache: CompletionCache,
    ) -> Self {
        Self {
            transport,
            keys,
            policy,
            cache,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport: Arc<dyn CompletionTransport> = match config.provider {
            ProviderKind::OpenAi => Arc::new(OpenAiTransport::new(
                config.base_url.clone(),
                config.model.clone(),
            )?),
            ProviderKind::Gemini => Arc::new(GeminiTransport::new(
                config.base_url.clone(),
                config.model.clone(),
            )?),
        };

        info!(
            provider = transport.provider(),
            model = %config.model,
            keys = config.api_keys.len(),
            cache_capacity = config.cache_capacity,
            "Completion gateway configured"
        );

        Ok(Self::new(
            transport,
            KeyPool::new(config.api_keys.clone())?,
            RetryPolicy {
                passes: 2,
                backoff: config.rate_limit_backoff,
            },
            CompletionCache::new(config.cache_capacity),
        ))
    }

    pub fn cache(&self) -> &CompletionCache {
        &self.cache
    }
}

#[async_trait]
impl CompletionClient for CompletionGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        request.validate()?;

        let key = request.cache_key();
        if let Some(hit) = self.cache.get(&key).await {
            debug!(key = %&key[..12], "Completion memo hit");
            return Ok(hit);
        }

        debug!(provider = self.transport.provider(), prompt = %request.prompt, "Sending completion");

        let mut attempts = 0;
        let mut last_error = String::new();

        for pass in 0..self.policy.passes {
            if pass > 0 {
                warn!(
                    pass,
                    backoff_ms = self.policy.backoff.as_millis() as u64,
                    "Every key rate limited, backing off"
                );
                tokio::time::sleep(self.policy.backoff).await;
            }

            for _ in 0..self.keys.len() {
                let api_key = self.keys.next_key();
                attempts += 1;

                match self.transport.send(api_key, request).await {
                    Ok(text) => {
                        debug!(attempts, completion = %text, "Completion received");
                        self.cache.insert(key, text.clone()).await;
                        return Ok(text);
                    }
                    Err(AssistantError::RateLimited(reason)) => {
                        warn!(attempt = attempts, "Rate limited, rotating API key");
                        last_error = reason;
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        Err(AssistantError::UpstreamExhausted {
            attempts,
            last_error,
        })
    }
}
