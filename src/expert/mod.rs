//! Expert-system scripts
//!
//! Stage-based sub-dialogues layered on the LLM. The model plays an inline
//! worked script and writes `Analyzing:`, `Current stage:` and
//! `- Assistant:`. Code takes three things from it:
//! - slot signals from the analysis (`SET_INCOME[...]` etc.)
//! - the BREAK sentinel
//! - the reply text
//!
//! The stage actually used is computed by each script's transition
//! function over the signals. When it disagrees with the model's label the
//! code's stage wins and the script answers with its own canned text.

pub mod budget;
pub mod calculator;
pub mod loan;
pub mod savings;
pub mod signals;
pub mod table;

pub use budget::BudgetScript;
pub use loan::LoanScript;
pub use savings::SavingsScript;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::completion::{CompletionClient, CompletionRequest};
use crate::error::AssistantError;
use crate::lang::{detect_language, Language};
use crate::models::Message;
use crate::parser::find_after_last;
use crate::prompt::{normalize_whitespace, template, Closing, PromptBuilder, PromptTask};
use crate::Result;
use signals::{read_signals, Signals};

const SCRIPT_MAX_TOKENS: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Numbered(u8),
    Break,
}

/// Reply of one script turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReply {
    pub message: String,
    pub suggestions: Vec<String>,
}

impl ScriptReply {
    pub fn new(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            message: message.into(),
            suggestions,
        }
    }
}

#[async_trait]
pub trait ExpertScript: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether a user turn is on this script's topic.
    fn handles(&self, text: &str) -> bool;

    /// `Ok(None)` means BREAK: the caller falls through to another handler.
    async fn advance(&self, messages: &[Message]) -> Result<Option<ScriptReply>>;
}

pub(crate) fn mentions_any(text: &str, topics: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    topics.iter().any(|topic| lowered.contains(topic))
}

/// Parse the model's stage label. Stage numbers beyond `stages` imply BREAK.
pub fn parse_stage(raw: &str, stages: u8) -> Result<Stage> {
    if raw.contains("BREAK") {
        return Ok(Stage::Break);
    }

    let label = find_after_last(raw, "Current stage:", &["\n", "- Assistant:"])
        .ok_or_else(|| AssistantError::ParseError("marker 'Current stage:' not found".to_string()))?;
    let label = normalize_whitespace(&label);

    let number = label
        .strip_prefix("Stage")
        .or_else(|| label.strip_prefix("stage"))
        .map(str::trim_start)
        .and_then(|rest| {
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u8>().ok()
        })
        .ok_or_else(|| AssistantError::InvalidStage(label.clone()))?;

    match number {
        0 => Err(AssistantError::InvalidStage(label)),
        n if n > stages => Ok(Stage::Break),
        n => Ok(Stage::Numbered(n)),
    }
}

/// Text between the last `- Assistant:` and the next `Current stage:`.
pub fn assistant_reply(raw: &str) -> Result<String> {
    find_after_last(raw, "- Assistant:", &["Current stage:"])
        .map(|reply| normalize_whitespace(&reply))
        .ok_or_else(|| AssistantError::ParseError("marker '- Assistant:' not found".to_string()))
}

/// One model pass over a script prompt.
#[derive(Debug, Clone)]
pub struct ScriptRun {
    pub model_stage: Stage,
    pub reply: String,
    pub signals: Signals,
    pub language: Language,
}

impl ScriptRun {
    /// Whether the model's label matches the computed stage; logs when not.
    pub fn agrees_with(&self, script: &str, computed: u8) -> bool {
        match self.model_stage {
            Stage::Numbered(n) if n == computed => true,
            model => {
                warn!(script, model = ?model, computed, "Model stage overridden by signals");
                false
            }
        }
    }
}

pub async fn run_script(
    client: &dyn CompletionClient,
    task: PromptTask,
    stages: u8,
    messages: &[Message],
) -> Result<ScriptRun> {
    let last = messages.last().ok_or(AssistantError::EmptyConversation)?;
    let language = detect_language(&last.content);

    let template = template(task);
    let prompt = PromptBuilder::from_template(template)
        .line_prefix("- ")
        .closing(Closing::Literal("Analyzing:"))
        .build(messages)?;

    let request = CompletionRequest::new(prompt, SCRIPT_MAX_TOKENS)
        .temperature(0.0)
        .stop(format!("- {}:", normalize_whitespace(&last.user)));

    let raw = client.complete(&request).await?;
    debug!(version = template.version, completion = %raw, "Script completion");

    let model_stage = parse_stage(&raw, stages)?;
    let reply = match model_stage {
        Stage::Break => String::new(),
        Stage::Numbered(_) => assistant_reply(&raw)?,
    };

    let run = ScriptRun {
        model_stage,
        reply,
        signals: read_signals(&raw),
        language,
    };
    info!(task = ?task, stage = ?run.model_stage, "Script stage read");
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stage_labels() {
        let raw = " User is asking about how to save money.\nCurrent stage: Stage 1\n- Assistant: Đối với tiết kiệm...";
        assert_eq!(parse_stage(raw, 3).unwrap(), Stage::Numbered(1));
        assert_eq!(parse_stage("Current stage: Stage 3.", 3).unwrap(), Stage::Numbered(3));
    }

    #[test]
    fn test_break_direct_and_implied() {
        assert_eq!(parse_stage("Off topic.\nCurrent stage: BREAK", 3).unwrap(), Stage::Break);
        assert_eq!(parse_stage("Current stage: Stage 4\n- Assistant: ...", 3).unwrap(), Stage::Break);
    }

    #[test]
    fn test_stage_errors() {
        assert!(matches!(parse_stage("no stage here", 3), Err(AssistantError::ParseError(_))));
        assert!(matches!(parse_stage("Current stage: Phase 2", 3), Err(AssistantError::InvalidStage(_))));
        assert!(matches!(parse_stage("Current stage: Stage 0", 3), Err(AssistantError::InvalidStage(_))));
    }

    #[test]
    fn test_assistant_reply_is_normalized() {
        let raw = "x\nCurrent stage: Stage 2\n- Assistant:  Thu nhập hàng tháng\n của bạn là bao nhiêu? ";
        assert_eq!(assistant_reply(raw).unwrap(), "Thu nhập hàng tháng của bạn là bao nhiêu?");
        assert!(assistant_reply("Current stage: Stage 2").is_err());
    }

    #[test]
    fn test_mentions_any_is_case_insensitive() {
        assert!(mentions_any("Help me with SAVING money", &["saving"]));
        assert!(mentions_any("Mình muốn được tư vấn về vấn đề tiết kiệm", &["tiết kiệm"]));
        assert!(!mentions_any("Chuyển Nam 300k", &["tiết kiệm", "saving"]));
    }
}
