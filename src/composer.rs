//! Response composer
//!
//! Wire shape of a `/api/chat` reply. Keys are present only when the branch
//! that produced the reply fills them.

use serde::Serialize;

use crate::models::{Action, ASSISTANT_USER};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyMessage {
    pub role: String,
    pub content: String,
}

impl ReplyMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ASSISTANT_USER.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ReplyMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl ChatReply {
    /// Action only (balance checks, completed slot filling, no-action).
    pub fn action(action: Action) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    /// Greeting for an empty conversation: no action key.
    pub fn greeting(content: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            action: None,
            message: Some(ReplyMessage::assistant(content)),
            suggestions: Some(suggestions),
        }
    }

    pub fn assistant(content: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            action: Some(Action::ask_assistant()),
            message: Some(ReplyMessage::assistant(content)),
            suggestions: Some(suggestions),
        }
    }

    /// Slot filling fell short: ASK_ASSISTANT with the question and no suggestions.
    pub fn clarify(question: impl Into<String>) -> Self {
        Self::assistant(question, Vec::new())
    }
}
