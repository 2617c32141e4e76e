//! Ask-assistant desk
//!
//! Handles every turn routed to the assistant itself:
//! - empty conversation: canned introduction
//! - an expert script whose topic appears in a recent user turn
//! - otherwise a general answer with follow-up suggestions

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::completion::{CompletionClient, CompletionRequest};
use crate::error::AssistantError;
use crate::expert::{BudgetScript, ExpertScript, LoanScript, SavingsScript, ScriptReply};
use crate::lang::{detect_language, Language};
use crate::models::{Message, ASSISTANT_USER};
use crate::parser::find_after_last;
use crate::prompt::{normalize_whitespace, template, Closing, PromptBuilder, PromptTask};
use crate::translate::Translator;
use crate::Result;

const GENERAL_TOP_P: f32 = 0.95;
const GENERAL_MAX_TOKENS: u32 = 512;
const SCRIPT_LOOKBACK: usize = 7;

pub const INTRODUCTION: &str = "Hi, I am your personal finance assistant. Here is what I can do for you:
- Check your account balance
- Send money to a friend or to everyone in the chat
- Create a chat group
- Give financial advice, for example:
    + Plan a monthly budget.
    + Work out a savings target.
    + Check whether a loan is usury.
    + Suggest how to invest or pay off debt.
What would you like to do today?";

const INTRODUCTION_SUGGESTIONS: [&str; 4] = [
    "I want to check my account balance",
    "Send Minh 40k for lunch",
    "Create a chat group with Hung and Cuong",
    "I want to ask for financial advice",
];

const ADVICE_SUGGESTIONS: [&str; 5] = [
    "Help me create a monthly budget plan",
    "Help me calculate my target saving plan",
    "Help me detect if a loan is usury or not",
    "Help me invest my money",
    "Help me pay off my debt",
];

lazy_static! {
    static ref CHATGPT: Regex = Regex::new(r"(?i)chatgpt").unwrap();
}

/// Message and follow-up suggestions for one assistant turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub message: String,
    pub suggestions: Vec<String>,
}

impl From<ScriptReply> for AssistantReply {
    fn from(reply: ScriptReply) -> Self {
        Self {
            message: reply.message,
            suggestions: reply.suggestions,
        }
    }
}

pub fn introduction() -> AssistantReply {
    AssistantReply {
        message: INTRODUCTION.to_string(),
        suggestions: INTRODUCTION_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn scrub_assistant_name(text: &str) -> String {
    CHATGPT.replace_all(text, "your personal assistant").into_owned()
}

/// Split a general-assistant completion into reply and suggestions.
///
/// Without a `RESPONSE:` marker everything before `SUGGESTIONS:` is the reply.
/// An empty suggestion list falls back to the advice topics.
pub fn parse_general_reply(raw: &str) -> Result<AssistantReply> {
    let message = match find_after_last(raw, "RESPONSE:", &["SUGGESTIONS:"]) {
        Some(message) => message,
        None => raw.split("SUGGESTIONS:").next().unwrap_or_default().trim().to_string(),
    };
    if message.is_empty() {
        return Err(AssistantError::ParseError("assistant response is empty".to_string()));
    }

    let mut suggestions: Vec<String> = find_after_last(raw, "SUGGESTIONS:", &["RESPONSE:"])
        .map(|block| {
            block
                .lines()
                .map(|line| line.trim().trim_start_matches(&['-', '*', '•'][..]))
                .map(normalize_whitespace)
                .filter(|line| !line.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if suggestions.is_empty() {
        suggestions = ADVICE_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
    }

    Ok(AssistantReply {
        message: scrub_assistant_name(&message),
        suggestions,
    })
}

pub struct AssistantDesk {
    client: Arc<dyn CompletionClient>,
    scripts: Vec<Box<dyn ExpertScript>>,
    translator: Translator,
}

impl AssistantDesk {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        let scripts: Vec<Box<dyn ExpertScript>> = vec![
            Box::new(SavingsScript::new(client.clone())),
            Box::new(BudgetScript::new(client.clone())),
            Box::new(LoanScript::new(client.clone())),
        ];
        Self::with_scripts(client, scripts)
    }

    pub fn with_scripts(client: Arc<dyn CompletionClient>, scripts: Vec<Box<dyn ExpertScript>>) -> Self {
        Self {
            translator: Translator::new(client.clone()),
            client,
            scripts,
        }
    }

    pub async fn respond(&self, messages: &[Message], status: Option<&str>) -> Result<AssistantReply> {
        if messages.is_empty() {
            info!("Empty conversation, sending introduction");
            return Ok(introduction());
        }

        let reply = match self.run_script(messages).await? {
            Some(reply) => reply,
            None => self.general_answer(messages, status).await?,
        };

        let language = reply_language(messages);
        let suggestions = self.translator.localize_all(reply.suggestions, language).await;

        Ok(AssistantReply {
            message: reply.message,
            suggestions,
        })
    }

    /// Newest user turn on a script's topic picks the script.
    fn select_script(&self, messages: &[Message]) -> Option<&dyn ExpertScript> {
        messages
            .iter()
            .rev()
            .take(SCRIPT_LOOKBACK)
            .filter(|message| !message.is_assistant())
            .find_map(|message| {
                self.scripts
                    .iter()
                    .find(|script| script.handles(&message.content))
                    .map(|script| script.as_ref())
            })
    }

    async fn run_script(&self, messages: &[Message]) -> Result<Option<AssistantReply>> {
        let Some(script) = self.select_script(messages) else {
            return Ok(None);
        };

        info!(script = script.name(), "Expert script selected");
        match script.advance(messages).await? {
            Some(reply) => Ok(Some(reply.into())),
            None => {
                info!(script = script.name(), "Falling through to general answer");
                Ok(None)
            }
        }
    }

    async fn general_answer(&self, messages: &[Message], status: Option<&str>) -> Result<AssistantReply> {
        let last = messages.last().ok_or(AssistantError::EmptyConversation)?;
        let template = template(PromptTask::GeneralAssistant);
        let cue = format!("{}:", ASSISTANT_USER);

        let mut builder = PromptBuilder::from_template(template).closing(Closing::Literal(&cue));
        if let Some(status) = status {
            builder = builder.preamble_line(format!("System: {}", normalize_whitespace(status)));
        }
        let prompt = builder.build(messages)?;

        let request = CompletionRequest::new(prompt, GENERAL_MAX_TOKENS)
            .top_p(GENERAL_TOP_P)
            .stop(format!("\n{}:", normalize_whitespace(&last.user)));

        let raw = self.client.complete(&request).await?;
        debug!(version = template.version, completion = %raw, "General assistant completion");

        parse_general_reply(&raw)
    }
}

/// Language of the latest user turn; English when only the assistant spoke.
fn reply_language(messages: &[Message]) -> Language {
    messages
        .iter()
        .rev()
        .find(|message| !message.is_assistant())
        .map(|message| detect_language(&message.content))
        .unwrap_or(Language::English)
}
