//! Core data models for the finance chat assistant

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AssistantError;

/// Display name reserved for bot-authored turns.
pub const ASSISTANT_USER: &str = "assistant";

//
// ================= Conversation =================
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub user: String,
    pub content: String,
}

impl Message {
    pub fn new(user: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            content: content.into(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.user.trim().eq_ignore_ascii_case(ASSISTANT_USER)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub status: Option<String>,
}

/// A validated `/api/chat` request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub user_info: Option<UserInfo>,
}

impl ChatRequest {
    pub fn user_status(&self) -> Option<&str> {
        self.user_info
            .as_ref()
            .and_then(|info| info.status.as_deref())
            .filter(|status| !status.trim().is_empty())
    }
}

//
// ================= Intent =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    CheckBalance,
    Transfer,
    TransferToEachUsers,
    CreateChatGroup,
    AskAssistant,
    ViewUserAccountReport,
    NoSystemAction,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::CheckBalance,
        Intent::Transfer,
        Intent::TransferToEachUsers,
        Intent::CreateChatGroup,
        Intent::AskAssistant,
        Intent::ViewUserAccountReport,
        Intent::NoSystemAction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CheckBalance => "CHECK_BALANCE",
            Intent::Transfer => "TRANSFER",
            Intent::TransferToEachUsers => "TRANSFER_TO_EACH_USERS",
            Intent::CreateChatGroup => "CREATE_CHAT_GROUP",
            Intent::AskAssistant => "ASK_ASSISTANT",
            Intent::ViewUserAccountReport => "VIEW_USER_ACCOUNT_REPORT",
            Intent::NoSystemAction => "NO_SYSTEM_ACTION",
        }
    }
}

impl FromStr for Intent {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| AssistantError::InvalidIntent(s.to_string()))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ================= Actions =================
//

/// Action types that go through slot filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Transfer,
    TransferToEachUsers,
    CreateChatGroup,
}

impl ActionKind {
    pub fn from_intent(intent: Intent) -> Option<Self> {
        match intent {
            Intent::Transfer => Some(ActionKind::Transfer),
            Intent::TransferToEachUsers => Some(ActionKind::TransferToEachUsers),
            Intent::CreateChatGroup => Some(ActionKind::CreateChatGroup),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Transfer => "TRANSFER",
            ActionKind::TransferToEachUsers => "TRANSFER_TO_EACH_USERS",
            ActionKind::CreateChatGroup => "CREATE_CHAT_GROUP",
        }
    }

    pub fn command(&self) -> ActionCommand {
        match self {
            ActionKind::Transfer => ActionCommand::Transfer,
            ActionKind::TransferToEachUsers => ActionCommand::TransferToEachUsers,
            ActionKind::CreateChatGroup => ActionCommand::CreateChatGroup,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command names as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionCommand {
    CheckBalance,
    Transfer,
    TransferToEachUsers,
    CreateChatGroup,
    AskAssistant,
    ViewUserAccountReport,
    NoAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionParams {
    Transfer {
        receiver: String,
        amount: String,
        msg: Option<String>,
    },
    TransferToEachUsers {
        amount_each: String,
        msg: Option<String>,
    },
    CreateChatGroup {
        members: Vec<String>,
        group_name: Option<String>,
    },
    User {
        user: String,
    },
    Empty {},
}

impl ActionParams {
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            ActionParams::Transfer { .. } => Some(ActionKind::Transfer),
            ActionParams::TransferToEachUsers { .. } => Some(ActionKind::TransferToEachUsers),
            ActionParams::CreateChatGroup { .. } => Some(ActionKind::CreateChatGroup),
            ActionParams::User { .. } | ActionParams::Empty {} => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub command: ActionCommand,
    pub params: ActionParams,
}

impl Action {
    pub fn new(command: ActionCommand, params: ActionParams) -> Self {
        Self { command, params }
    }

    pub fn no_action() -> Self {
        Self::new(ActionCommand::NoAction, ActionParams::Empty {})
    }

    pub fn ask_assistant() -> Self {
        Self::new(ActionCommand::AskAssistant, ActionParams::Empty {})
    }

    pub fn for_user(command: ActionCommand, user: impl Into<String>) -> Self {
        Self::new(command, ActionParams::User { user: user.into() })
    }
}
