//! Suggestion translation
//!
//! Suggestions are advisory, so a failed translation keeps the original text.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::completion::{CompletionClient, CompletionRequest};
use crate::error::AssistantError;
use crate::lang::{detect_language, Language};
use crate::Result;

const TRANSLATION_TOP_P: f32 = 0.92;
const MIN_TRANSLATION_TOKENS: u32 = 64;
const MAX_TRANSLATION_TOKENS: u32 = 512;

#[derive(Clone)]
pub struct Translator {
    client: Arc<dyn CompletionClient>,
}

impl Translator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub async fn translate(&self, text: &str, from: Language, to: Language) -> Result<String> {
        if from == to || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let prompt = format!(
            "Translate from {} into {}:\n{}\n\n{}:",
            from.name(),
            to.name(),
            text,
            to.name()
        );
        let budget = (text.len() as u32).clamp(MIN_TRANSLATION_TOKENS, MAX_TRANSLATION_TOKENS);
        let request = CompletionRequest::new(prompt, budget)
            .top_p(TRANSLATION_TOP_P)
            .stop("\n\n");

        let raw = self.client.complete(&request).await?;
        let translated = raw.trim();
        if translated.is_empty() {
            return Err(AssistantError::ParseError("empty translation".to_string()));
        }

        debug!(from = %from, to = %to, "Translated text");
        Ok(translated.to_string())
    }

    /// Translate every text not already in `target`, one task per text,
    /// keeping input order.
    pub async fn localize_all(&self, texts: Vec<String>, target: Language) -> Vec<String> {
        let pending: Vec<(String, Option<JoinHandle<Result<String>>>)> = texts
            .into_iter()
            .map(|text| {
                let from = detect_language(&text);
                if from == target {
                    return (text, None);
                }
                let translator = self.clone();
                let source = text.clone();
                let handle =
                    tokio::spawn(async move { translator.translate(&source, from, target).await });
                (text, Some(handle))
            })
            .collect();

        let mut localized = Vec::with_capacity(pending.len());
        for (original, handle) in pending {
            let Some(handle) = handle else {
                localized.push(original);
                continue;
            };
            match handle.await {
                Ok(Ok(translated)) => localized.push(translated),
                Ok(Err(e)) => {
                    warn!(error = %e, text = %original, "Translation failed, keeping original");
                    localized.push(original);
                }
                Err(join_error) => {
                    warn!(error = %join_error, text = %original, "Translation task aborted, keeping original");
                    localized.push(original);
                }
            }
        }
        localized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::MockCompletionClient;

    #[tokio::test]
    async fn test_translate_prompt_and_sampling() {
        let mock = Arc::new(
            MockCompletionClient::new().with_rule("Help me invest my money", " Giúp mình đầu tư tiền\n"),
        );
        let translator = Translator::new(mock.clone());

        let out = translator
            .translate("Help me invest my money", Language::English, Language::Vietnamese)
            .await
            .unwrap();
        assert_eq!(out, "Giúp mình đầu tư tiền");

        let requests = mock.requests().await;
        assert_eq!(
            requests[0].prompt,
            "Translate from English into Vietnamese:\nHelp me invest my money\n\nVietnamese:"
        );
        assert_eq!(requests[0].top_p, Some(0.92));
        assert_eq!(requests[0].temperature, None);
    }

    #[tokio::test]
    async fn test_same_language_is_untouched() {
        let mock = Arc::new(MockCompletionClient::new());
        let translator = Translator::new(mock.clone());
        let out = translator
            .translate("5 triệu", Language::Vietnamese, Language::Vietnamese)
            .await
            .unwrap();
        assert_eq!(out, "5 triệu");
        assert!(mock.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_localize_all_keeps_order_and_failures() {
        let mock = Arc::new(
            MockCompletionClient::new()
                .with_rule("Help me create a monthly budget plan", "Giúp mình lập kế hoạch chi tiêu hàng tháng"),
        );
        let translator = Translator::new(mock.clone());

        let texts = vec![
            "Help me create a monthly budget plan".to_string(),
            "12 triệu".to_string(),
            "Help me pay off my debt".to_string(),
        ];
        let out = translator.localize_all(texts, Language::Vietnamese).await;

        assert_eq!(
            out,
            vec![
                "Giúp mình lập kế hoạch chi tiêu hàng tháng".to_string(),
                "12 triệu".to_string(),
                "Help me pay off my debt".to_string(),
            ]
        );
        assert_eq!(mock.requests().await.len(), 2);
    }
}
