//! Intent Router
//!
//! Classifies the latest user turn into one of the fixed intents:
//! - CHECK_BALANCE, TRANSFER, TRANSFER_TO_EACH_USERS, CREATE_CHAT_GROUP
//! - ASK_ASSISTANT, VIEW_USER_ACCOUNT_REPORT, NO_SYSTEM_ACTION
//!
//! VIEW_USER_ACCOUNT_REPORT is only trusted after a second, checklist-style
//! completion confirms it. Anything else is downgraded to NO_SYSTEM_ACTION.

use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::completion::{CompletionClient, CompletionRequest};
use crate::error::AssistantError;
use crate::models::{Intent, Message};
use crate::prompt::{normalize_whitespace, template, Closing, PromptBuilder, PromptTask};
use crate::Result;

const INTENT_MAX_TOKENS: u32 = 12;
const CHECKLIST_MAX_TOKENS: u32 = 48;
const CHECKLIST_ITEMS: usize = 3;

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn detect_intent(&self, messages: &[Message]) -> Result<Intent>;
}

pub struct LlmIntentClassifier {
    client: Arc<dyn CompletionClient>,
}

impl LlmIntentClassifier {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    async fn first_pass(&self, messages: &[Message]) -> Result<Intent> {
        let template = template(PromptTask::DetectIntent);
        let prompt = PromptBuilder::from_template(template)
            .closing(Closing::Possessive("intention:"))
            .build(messages)?;

        let request = CompletionRequest::new(prompt, INTENT_MAX_TOKENS)
            .temperature(0.0)
            .stop("]");

        let raw = self.client.complete(&request).await?;
        let label = normalize_whitespace(&raw);
        debug!(version = template.version, label = %label, "Intent completion");

        label.parse::<Intent>()
    }

    async fn confirm_account_report(&self, messages: &[Message]) -> Result<bool> {
        let template = template(PromptTask::ConfirmAccountReport);
        let prompt = PromptBuilder::from_template(template)
            .closing(Closing::Literal("Answers:"))
            .build(messages)?;

        let request = CompletionRequest::new(prompt, CHECKLIST_MAX_TOKENS).temperature(0.0);
        let raw = self.client.complete(&request).await?;
        let answers = parse_checklist(&raw)?;

        Ok(answers == [Some(true), Some(false), Some(false)])
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn detect_intent(&self, messages: &[Message]) -> Result<Intent> {
        let intent = self.first_pass(messages).await?;

        if intent != Intent::ViewUserAccountReport {
            info!(intent = %intent, "Intent detected");
            return Ok(intent);
        }

        if self.confirm_account_report(messages).await? {
            info!(intent = %intent, "Account report confirmed by checklist");
            Ok(intent)
        } else {
            info!("Account report not confirmed, downgrading to NO_SYSTEM_ACTION");
            Ok(Intent::NoSystemAction)
        }
    }
}

lazy_static! {
    static ref ITEM_MARKER: Regex = Regex::new(r"\b(\d{1,2})[.):]").unwrap();
}

/// Per-item YES/NO answers of the numbered checklist.
///
/// Unanswered items stay `None`. A reply with no numbered answer at all is a
/// parse error.
pub fn parse_checklist(raw: &str) -> Result<[Option<bool>; CHECKLIST_ITEMS]> {
    let mut answers = [None; CHECKLIST_ITEMS];

    // Each item runs from its marker to the next one, on any line
    let markers: Vec<(usize, usize, usize)> = ITEM_MARKER
        .captures_iter(raw)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number: usize = caps[1].parse().ok()?;
            Some((number, whole.start(), whole.end()))
        })
        .collect();

    for (i, &(number, _, text_start)) in markers.iter().enumerate() {
        if number == 0 || number > CHECKLIST_ITEMS {
            continue;
        }
        let text_end = markers.get(i + 1).map_or(raw.len(), |&(_, start, _)| start);
        if answers[number - 1].is_none() {
            answers[number - 1] = parse_answer(&raw[text_start..text_end]);
        }
    }

    if answers.iter().all(Option::is_none) {
        return Err(AssistantError::ParseError(format!(
            "no checklist answers in completion: {}",
            raw.trim()
        )));
    }
    Ok(answers)
}

// Last YES/NO word wins, so echoed questions ("1. Does ...? NO") still parse.
fn parse_answer(text: &str) -> Option<bool> {
    text.to_uppercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter_map(|word| match word {
            "YES" | "CÓ" => Some(true),
            "NO" | "KHÔNG" => Some(false),
            _ => None,
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::MockCompletionClient;

    const INTENT_NEEDLE: &str = "intention detecting system";
    const CHECKLIST_NEEDLE: &str = "verification step";

    fn conversation(content: &str) -> Vec<Message> {
        vec![
            Message::new("Lan", "Ready for a party?"),
            Message::new("Minh", content),
        ]
    }

    #[tokio::test]
    async fn test_detects_each_intent() {
        for intent in Intent::ALL {
            if intent == Intent::ViewUserAccountReport {
                continue;
            }
            let mock = Arc::new(MockCompletionClient::new().with_rule(INTENT_NEEDLE, format!(" {}\n", intent)));
            let classifier = LlmIntentClassifier::new(mock);
            let detected = classifier.detect_intent(&conversation("hello")).await.unwrap();
            assert_eq!(detected, intent);
        }
    }

    #[tokio::test]
    async fn test_request_shape() {
        let mock = Arc::new(MockCompletionClient::new().with_rule(INTENT_NEEDLE, "CHECK_BALANCE"));
        let classifier = LlmIntentClassifier::new(mock.clone());
        classifier
            .detect_intent(&conversation("Tài khoản của tao còn bao nhiêu tiền?"))
            .await
            .unwrap();

        let requests = mock.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 12);
        assert_eq!(requests[0].temperature, Some(0.0));
        assert_eq!(requests[0].stop, vec!["]".to_string()]);
        assert!(requests[0].prompt.ends_with("Minh's intention:"));
    }

    #[tokio::test]
    async fn test_unknown_label_is_fatal() {
        let mock = Arc::new(MockCompletionClient::new().with_rule(INTENT_NEEDLE, "SEND_MONEY"));
        let classifier = LlmIntentClassifier::new(mock);
        let err = classifier.detect_intent(&conversation("hi")).await.unwrap_err();
        assert!(matches!(err, AssistantError::InvalidIntent(label) if label == "SEND_MONEY"));
    }

    #[tokio::test]
    async fn test_account_report_confirmed() {
        let mock = Arc::new(
            MockCompletionClient::new()
                .with_rule(CHECKLIST_NEEDLE, "1. YES\n2. NO\n3. NO")
                .with_rule(INTENT_NEEDLE, "VIEW_USER_ACCOUNT_REPORT"),
        );
        let classifier = LlmIntentClassifier::new(mock.clone());
        let intent = classifier
            .detect_intent(&conversation("Cho tao xem báo cáo chi tiêu tháng này"))
            .await
            .unwrap();
        assert_eq!(intent, Intent::ViewUserAccountReport);
        assert_eq!(mock.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_account_report_confirmed_on_one_line() {
        let mock = Arc::new(
            MockCompletionClient::new()
                .with_rule(CHECKLIST_NEEDLE, " 1. YES 2. NO 3. NO")
                .with_rule(INTENT_NEEDLE, "VIEW_USER_ACCOUNT_REPORT"),
        );
        let classifier = LlmIntentClassifier::new(mock);
        let intent = classifier
            .detect_intent(&conversation("Cho tao xem báo cáo chi tiêu tháng này"))
            .await
            .unwrap();
        assert_eq!(intent, Intent::ViewUserAccountReport);
    }

    #[tokio::test]
    async fn test_account_report_downgraded() {
        let replies = [
            "1. YES\n2. YES\n3. NO",
            "1. NO\n2. NO\n3. NO",
            "1. YES\n2. NO\n3. YES",
            "1. YES\n2. NO",
            "1. YES 2. YES 3. NO",
        ];
        for reply in replies {
            let mock = Arc::new(
                MockCompletionClient::new()
                    .with_rule(CHECKLIST_NEEDLE, reply)
                    .with_rule(INTENT_NEEDLE, "VIEW_USER_ACCOUNT_REPORT"),
            );
            let classifier = LlmIntentClassifier::new(mock);
            let intent = classifier.detect_intent(&conversation("xem báo cáo của Lan")).await.unwrap();
            assert_eq!(intent, Intent::NoSystemAction, "{}", reply);
        }
    }

    #[test]
    fn test_parse_checklist_variants() {
        assert_eq!(
            parse_checklist("1) Có\n2: Không\n3. KHÔNG").unwrap(),
            [Some(true), Some(false), Some(false)]
        );
        assert_eq!(
            parse_checklist("1. Does the user want their own report? YES\n2. no\n").unwrap(),
            [Some(true), Some(false), None]
        );
        assert_eq!(
            parse_checklist("1. YES 2. NO 3. NO").unwrap(),
            [Some(true), Some(false), Some(false)]
        );
        assert_eq!(
            parse_checklist("Answers: 1) Có, 2) không, 3) KHÔNG").unwrap(),
            [Some(true), Some(false), Some(false)]
        );
        assert!(matches!(parse_checklist("I think so."), Err(AssistantError::ParseError(_))));
    }
}
