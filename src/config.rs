//! Process configuration loaded from the environment
//!
//! Binaries call `dotenv::dotenv()` first, so a local `.env` file works too.

use std::time::Duration;

use crate::error::AssistantError;
use crate::Result;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ENSEMBLE_SIZE: usize = 3;
const DEFAULT_CACHE_CAPACITY: usize = 1024;
const DEFAULT_BACKOFF_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl ProviderKind {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" | "open_ai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(AssistantError::ConfigError(format!(
                "Unknown COMPLETION_PROVIDER '{}' (expected openai or gemini)",
                other
            ))),
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-3.5-turbo-instruct",
            ProviderKind::Gemini => "gemini-2.0-flash",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub api_keys: Vec<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub port: u16,
    pub ensemble_size: usize,
    pub cache_capacity: usize,
    pub rate_limit_backoff: Duration,
    pub require_transfer_message: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = match var("COMPLETION_PROVIDER") {
            Some(value) => ProviderKind::parse(&value)?,
            None => ProviderKind::OpenAi,
        };

        let raw_keys = match provider {
            ProviderKind::OpenAi => var("OPENAI_API_KEYS").or_else(|| var("OPENAI_API_KEY")),
            ProviderKind::Gemini => var("GEMINI_API_KEYS").or_else(|| var("GEMINI_API_KEY")),
        };
        let api_keys = parse_key_list(raw_keys.as_deref());
        if api_keys.is_empty() {
            return Err(AssistantError::ConfigError(match provider {
                ProviderKind::OpenAi => "OPENAI_API_KEYS not configured".to_string(),
                ProviderKind::Gemini => "GEMINI_API_KEYS not configured".to_string(),
            }));
        }

        let port = match var("PORT").or_else(|| var("API_PORT")) {
            Some(value) => parse_number::<u16>("PORT", &value)?,
            None => DEFAULT_PORT,
        };

        let ensemble_size = match var("ENSEMBLE_SIZE") {
            Some(value) => parse_number::<usize>("ENSEMBLE_SIZE", &value)?,
            None => DEFAULT_ENSEMBLE_SIZE,
        };
        if ensemble_size == 0 {
            return Err(AssistantError::ConfigError(
                "ENSEMBLE_SIZE must be at least 1".to_string(),
            ));
        }

        let cache_capacity = match var("COMPLETION_CACHE_CAPACITY") {
            Some(value) => parse_number::<usize>("COMPLETION_CACHE_CAPACITY", &value)?,
            None => DEFAULT_CACHE_CAPACITY,
        };

        let backoff_secs = match var("RATE_LIMIT_BACKOFF_SECS") {
            Some(value) => parse_number::<u64>("RATE_LIMIT_BACKOFF_SECS", &value)?,
            None => DEFAULT_BACKOFF_SECS,
        };

        let require_transfer_message = match var("REQUIRE_TRANSFER_MESSAGE") {
            Some(value) => parse_flag("REQUIRE_TRANSFER_MESSAGE", &value)?,
            None => false,
        };

        Ok(Self {
            provider,
            api_keys,
            base_url: var("COMPLETION_API_BASE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string()),
            model: var("COMPLETION_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            port,
            ensemble_size,
            cache_capacity,
            rate_limit_backoff: Duration::from_secs(backoff_secs),
            require_transfer_message,
        })
    }
}

fn parse_key_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|keys| {
        keys.split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        AssistantError::ConfigError(format!("{} must be a non-negative integer, got '{}'", name, value))
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AssistantError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::assert_err;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEYS", "sk-a, sk-b,,")])).unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.api_keys, vec!["sk-a", "sk-b"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.ensemble_size, 3);
        assert_eq!(config.cache_capacity, 1024);
        assert_eq!(config.rate_limit_backoff, Duration::from_secs(5));
        assert!(!config.require_transfer_message);
        assert_eq!(config.model, "gpt-3.5-turbo-instruct");
    }

    #[test]
    fn test_missing_keys_is_config_error() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, AssistantError::ConfigError(_)));
    }

    #[test]
    fn test_gemini_single_key_fallback() {
        let config = AppConfig::from_lookup(lookup(&[
            ("COMPLETION_PROVIDER", "gemini"),
            ("GEMINI_API_KEY", "g-key"),
            ("API_PORT", "5000"),
            ("COMPLETION_API_BASE_URL", "http://localhost:9000/"),
        ]))
        .unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.api_keys, vec!["g-key"]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_err!(AppConfig::from_lookup(lookup(&[("OPENAI_API_KEYS", "k"), ("ENSEMBLE_SIZE", "0")])));
        assert_err!(AppConfig::from_lookup(lookup(&[("OPENAI_API_KEYS", "k"), ("PORT", "eighty")])));
        assert_err!(AppConfig::from_lookup(lookup(&[("OPENAI_API_KEYS", "k"), ("REQUIRE_TRANSFER_MESSAGE", "maybe")])));
        assert_err!(AppConfig::from_lookup(lookup(&[("OPENAI_API_KEYS", "k"), ("COMPLETION_PROVIDER", "llama")])));
    }

    #[test]
    fn test_require_transfer_message_flag() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEYS", "k"),
            ("REQUIRE_TRANSFER_MESSAGE", "true"),
            ("RATE_LIMIT_BACKOFF_SECS", "0"),
        ]))
        .unwrap();
        assert!(config.require_transfer_message);
        assert_eq!(config.rate_limit_backoff, Duration::ZERO);
    }
}
