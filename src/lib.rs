//! Finance Chat Assistant
//!
//! Conversational finance-assistant backend:
//! - Detects the intent of the latest chat turn with an LLM completion
//! - Fills action parameters (transfers, chat groups) with optional ensemble voting
//! - Runs stage-based expert scripts (savings, budget, loan) with deterministic arithmetic
//! - Answers general finance questions with localized follow-up suggestions
//!
//! REQUEST FLOW:
//! HISTORY → PROMPT → COMPLETION → PARSE → (INTENT | SLOTS | SCRIPT) → REPLY

pub mod agent;
pub mod api;
pub mod classifier;
pub mod completion;
pub mod composer;
pub mod config;
pub mod conversational;
pub mod error;
pub mod expert;
pub mod extractor;
pub mod lang;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod translate;

pub use error::Result;

// Re-export common types
pub use agent::ChatOrchestrator;
pub use composer::ChatReply;
pub use models::*;
