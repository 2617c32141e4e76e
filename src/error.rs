//! Error types for the finance chat assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Configuration
    // =============================

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Conversation history must not be empty")]
    EmptyConversation,

    // =============================
    // Completion Gateway
    // =============================

    #[error("Rate limited by completion provider: {0}")]
    RateLimited(String),

    #[error("Completion provider still throttling after {attempts} attempts: {last_error}")]
    UpstreamExhausted { attempts: usize, last_error: String },

    #[error("LLM error: {0}")]
    LlmError(String),

    // =============================
    // Output contract violations
    // =============================

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    #[error("Invalid stage: {0}")]
    InvalidStage(String),

    #[error("All {attempts} ensemble attempts failed: {last_error}")]
    EnsembleExhausted { attempts: usize, last_error: String },

    // =============================
    // Request shape
    // =============================

    #[error("{0}")]
    InvalidRequest(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AssistantError {
    /// Input-shape errors are the caller's fault; everything else fails the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AssistantError::InvalidRequest(_))
    }
}
