//! Marker-driven output parsing
//!
//! Completions are free text. Fields are found by splitting on the marker
//! vocabulary the prompt told the model to emit (`RESULT:`, `ACTION:`,
//! `Current stage:` ...), always taking the LAST occurrence of a marker.
//!
//! Action payloads use bracket syntax:
//!
//! ```text
//! NAME[required1,required2|optional]
//! ```

use crate::error::AssistantError;
use crate::models::{ActionKind, ActionParams};
use crate::Result;

/// Text after the last `marker`, cut at the earliest `stops` marker, trimmed.
pub fn extract_after_last(text: &str, marker: &str, stops: &[&str]) -> Result<String> {
    find_after_last(text, marker, stops)
        .ok_or_else(|| AssistantError::ParseError(format!("marker '{}' not found in completion", marker)))
}

pub fn find_after_last(text: &str, marker: &str, stops: &[&str]) -> Option<String> {
    let start = text.rfind(marker)? + marker.len();
    let rest = &text[start..];

    let end = stops
        .iter()
        .filter_map(|stop| rest.find(stop))
        .min()
        .unwrap_or(rest.len());

    Some(rest[..end].trim().to_string())
}

/// `"null"`, `"none"` (any case) and blank collapse to `None`.
pub fn normalize_nullable(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPayload {
    pub name: String,
    pub required: Vec<String>,
    pub optional: Option<String>,
}

/// Parse `NAME[a,b|c]`. The closing bracket may be missing because callers
/// use `]` as a stop sequence.
pub fn parse_bracketed(text: &str) -> Result<BracketPayload> {
    let text = text.trim();
    let open = text
        .find('[')
        .ok_or_else(|| AssistantError::ParseError(format!("no '[' in action payload: {}", text)))?;

    let name = text[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
        return Err(AssistantError::ParseError(format!(
            "malformed action name in payload: {}",
            text
        )));
    }

    let body = &text[open + 1..];
    let body = match body.find(']') {
        Some(close) => &body[..close],
        None => body,
    };

    let (required, optional) = match body.split_once('|') {
        Some((required, optional)) => (required, Some(optional.trim().to_string())),
        None => (body, None),
    };

    Ok(BracketPayload {
        name: name.to_string(),
        required: required.split(',').map(|field| field.trim().to_string()).collect(),
        optional,
    })
}

pub fn format_bracketed(payload: &BracketPayload) -> String {
    let mut out = format!("{}[{}", payload.name, payload.required.join(","));
    if let Some(optional) = &payload.optional {
        out.push('|');
        out.push_str(optional);
    }
    out.push(']');
    out
}

/// Typed parameters from an `ACTION:` payload.
///
/// Null required fields become empty strings; the extractor's validation
/// turns those into clarifying questions.
pub fn parse_action_payload(kind: ActionKind, text: &str) -> Result<ActionParams> {
    let payload = parse_bracketed(text)?;
    if payload.name != kind.as_str() {
        return Err(AssistantError::ParseError(format!(
            "expected {} payload, got {}",
            kind, payload.name
        )));
    }

    let required = |index: usize| {
        payload
            .required
            .get(index)
            .and_then(|field| normalize_nullable(field))
            .unwrap_or_default()
    };
    let optional = payload.optional.as_deref().and_then(normalize_nullable);

    Ok(match kind {
        ActionKind::Transfer => ActionParams::Transfer {
            receiver: required(0),
            amount: required(1),
            msg: optional,
        },
        ActionKind::TransferToEachUsers => ActionParams::TransferToEachUsers {
            amount_each: required(0),
            msg: optional,
        },
        ActionKind::CreateChatGroup => ActionParams::CreateChatGroup {
            members: payload
                .required
                .iter()
                .filter_map(|member| normalize_nullable(member))
                .collect(),
            group_name: optional,
        },
    })
}

/// Inverse of `parse_action_payload`. `None` for params without a payload form.
pub fn format_action_payload(params: &ActionParams) -> Option<String> {
    let nullable = |value: &Option<String>| value.clone().unwrap_or_else(|| "null".to_string());

    let payload = match params {
        ActionParams::Transfer {
            receiver,
            amount,
            msg,
        } => BracketPayload {
            name: ActionKind::Transfer.as_str().to_string(),
            required: vec![receiver.clone(), amount.clone()],
            optional: Some(nullable(msg)),
        },
        ActionParams::TransferToEachUsers { amount_each, msg } => BracketPayload {
            name: ActionKind::TransferToEachUsers.as_str().to_string(),
            required: vec![amount_each.clone()],
            optional: Some(nullable(msg)),
        },
        ActionParams::CreateChatGroup {
            members,
            group_name,
        } => BracketPayload {
            name: ActionKind::CreateChatGroup.as_str().to_string(),
            required: members.clone(),
            optional: Some(nullable(group_name)),
        },
        ActionParams::User { .. } | ActionParams::Empty {} => return None,
    };

    Some(format_bracketed(&payload))
}
