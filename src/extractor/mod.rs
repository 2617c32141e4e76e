//! Action Extractor
//!
//! Slot filling for TRANSFER, TRANSFER_TO_EACH_USERS and CREATE_CHAT_GROUP.
//! The model writes a reasoning trace, a per-field checklist, a RESULT
//! verdict and then either a clarifying RESPONSE or a bracketed ACTION.
//! Missing required fields never fail the request; they become a
//! clarifying question (`SlotFill::Clarify`).

pub mod ensemble;

pub use ensemble::{majority_vote, EnsembleExtractor};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::completion::{CompletionClient, CompletionRequest};
use crate::error::AssistantError;
use crate::lang::{detect_language, Language};
use crate::models::{ActionKind, ActionParams, Message};
use crate::parser::{extract_after_last, find_after_last, parse_action_payload};
use crate::prompt::{template, Closing, PromptBuilder, PromptTask};
use crate::Result;

const EXTRACTION_MAX_TOKENS: u32 = 256;

/// Outcome of one slot-filling round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum SlotFill {
    Complete(ActionParams),
    Clarify(String),
}

#[async_trait]
pub trait ActionExtractor: Send + Sync {
    async fn extract(&self, messages: &[Message], kind: ActionKind) -> Result<SlotFill>;
}

//
// ================= Field validation =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Receiver,
    Amount,
    AmountEach,
    Message,
    Members,
}

impl MissingField {
    pub fn question(&self, language: Language) -> &'static str {
        match self {
            MissingField::Receiver => language.pick(
                "Bạn muốn chuyển tiền cho ai?",
                "Who do you want to transfer money to?",
            ),
            MissingField::Amount => language.pick(
                "Bạn muốn chuyển bao nhiêu tiền?",
                "How much money do you want to transfer?",
            ),
            MissingField::AmountEach => language.pick(
                "Bạn muốn chuyển cho mỗi người bao nhiêu tiền?",
                "How much do you want to send to each person?",
            ),
            MissingField::Message => language.pick(
                "Bạn muốn gửi kèm lời nhắn gì?",
                "What message would you like to attach?",
            ),
            MissingField::Members => language.pick(
                "Bạn muốn tạo nhóm chat với những ai?",
                "Who do you want to add to the chat group?",
            ),
        }
    }
}

/// First missing field in priority order, if any.
///
/// `group_name` is always optional. `msg` is required only when
/// `require_message` is set.
pub fn first_missing_field(params: &ActionParams, require_message: bool) -> Option<MissingField> {
    let blank = |value: &str| value.trim().is_empty();
    let missing_msg = |msg: &Option<String>| require_message && msg.as_deref().map_or(true, blank);

    match params {
        ActionParams::Transfer {
            receiver,
            amount,
            msg,
        } => {
            if blank(receiver) {
                Some(MissingField::Receiver)
            } else if blank(amount) {
                Some(MissingField::Amount)
            } else if missing_msg(msg) {
                Some(MissingField::Message)
            } else {
                None
            }
        }
        ActionParams::TransferToEachUsers { amount_each, msg } => {
            if blank(amount_each) {
                Some(MissingField::AmountEach)
            } else if missing_msg(msg) {
                Some(MissingField::Message)
            } else {
                None
            }
        }
        ActionParams::CreateChatGroup { members, .. } => {
            if members.iter().all(|m| blank(m)) {
                Some(MissingField::Members)
            } else {
                None
            }
        }
        ActionParams::User { .. } | ActionParams::Empty {} => None,
    }
}

fn leading_field(kind: ActionKind) -> MissingField {
    match kind {
        ActionKind::Transfer => MissingField::Receiver,
        ActionKind::TransferToEachUsers => MissingField::AmountEach,
        ActionKind::CreateChatGroup => MissingField::Members,
    }
}

//
// ================= Completion parsing =================
//

/// Interpret one extraction completion.
pub fn parse_extraction(
    kind: ActionKind,
    raw: &str,
    require_message: bool,
    language: Language,
) -> Result<SlotFill> {
    let verdict = extract_after_last(raw, "RESULT:", &["\n", "RESPONSE:", "ACTION:"])?;
    let verdict = verdict
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_');

    let enough = match verdict {
        "ENOUGH_PARAMS" | "OK" => true,
        "NOT_ENOUGH_PARAMS" | "NO_USERS" => false,
        other => {
            return Err(AssistantError::ParseError(format!(
                "unexpected RESULT verdict '{}'",
                other
            )))
        }
    };

    if !enough {
        let response = find_after_last(raw, "RESPONSE:", &["ACTION:"]).filter(|r| !r.is_empty());
        return Ok(SlotFill::Clarify(match response {
            Some(text) => text,
            None => leading_field(kind).question(language).to_string(),
        }));
    }

    let payload = extract_after_last(raw, "ACTION:", &["\n"])?;
    let params = parse_action_payload(kind, &payload)?;

    Ok(match first_missing_field(&params, require_message) {
        Some(field) => {
            debug!(?field, "Action payload failed validation");
            SlotFill::Clarify(field.question(language).to_string())
        }
        None => SlotFill::Complete(params),
    })
}

//
// ================= LLM extractor =================
//

pub struct LlmActionExtractor {
    client: Arc<dyn CompletionClient>,
    require_transfer_message: bool,
}

impl LlmActionExtractor {
    pub fn new(client: Arc<dyn CompletionClient>, require_transfer_message: bool) -> Self {
        Self {
            client,
            require_transfer_message,
        }
    }

    fn task(kind: ActionKind) -> PromptTask {
        match kind {
            ActionKind::Transfer => PromptTask::ExtractTransfer,
            ActionKind::TransferToEachUsers => PromptTask::ExtractTransferToEachUsers,
            ActionKind::CreateChatGroup => PromptTask::ExtractCreateChatGroup,
        }
    }
}

#[async_trait]
impl ActionExtractor for LlmActionExtractor {
    async fn extract(&self, messages: &[Message], kind: ActionKind) -> Result<SlotFill> {
        let last = messages.last().ok_or(AssistantError::EmptyConversation)?;
        let language = detect_language(&last.content);

        let template = template(Self::task(kind));
        let closing = format!("request analysis for {}:\nReasoning:", kind);
        let prompt = PromptBuilder::from_template(template)
            .closing(Closing::Possessive(&closing))
            .build(messages)?;

        let request = CompletionRequest::new(prompt, EXTRACTION_MAX_TOKENS).temperature(0.0);
        let raw = self.client.complete(&request).await?;
        debug!(version = template.version, completion = %raw, "Extraction completion");

        let fill = parse_extraction(kind, &raw, self.require_transfer_message, language)?;
        info!(
            action = %kind,
            complete = matches!(fill, SlotFill::Complete(_)),
            "Slot filling finished"
        );
        Ok(fill)
    }
}
