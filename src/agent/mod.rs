//! Per-request chat orchestrator
//!
//! history → intent → (account action | slot filling | assistant desk) → reply
//!
//! Each request replays the full visible history; nothing is kept between
//! requests apart from the completion memo inside the gateway.

use std::sync::Arc;

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::classifier::{IntentClassifier, LlmIntentClassifier};
use crate::completion::{CompletionClient, CompletionGateway};
use crate::composer::ChatReply;
use crate::config::AppConfig;
use crate::conversational::AssistantDesk;
use crate::error::AssistantError;
use crate::extractor::{ActionExtractor, EnsembleExtractor, LlmActionExtractor, SlotFill};
use crate::models::{Action, ActionCommand, ActionKind, ChatRequest, Intent, Message};
use crate::prompt::normalize_whitespace;
use crate::Result;

pub struct ChatOrchestrator {
    classifier: Arc<dyn IntentClassifier>,
    extractor: Arc<dyn ActionExtractor>,
    desk: AssistantDesk,
}

impl ChatOrchestrator {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        extractor: Arc<dyn ActionExtractor>,
        desk: AssistantDesk,
    ) -> Self {
        Self {
            classifier,
            extractor,
            desk,
        }
    }

    /// Wire every component to one completion client. `ensemble_size > 1`
    /// wraps slot filling in majority voting.
    pub fn with_client(
        client: Arc<dyn CompletionClient>,
        ensemble_size: usize,
        require_transfer_message: bool,
    ) -> Self {
        let single: Arc<dyn ActionExtractor> =
            Arc::new(LlmActionExtractor::new(client.clone(), require_transfer_message));
        let extractor: Arc<dyn ActionExtractor> = if ensemble_size > 1 {
            Arc::new(EnsembleExtractor::new(single, ensemble_size))
        } else {
            single
        };

        Self::new(
            Arc::new(LlmIntentClassifier::new(client.clone())),
            extractor,
            AssistantDesk::new(client),
        )
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let gateway: Arc<dyn CompletionClient> = Arc::new(CompletionGateway::from_config(config)?);
        info!(
            ensemble_size = config.ensemble_size,
            require_transfer_message = config.require_transfer_message,
            "Chat orchestrator configured"
        );
        Ok(Self::with_client(
            gateway,
            config.ensemble_size,
            config.require_transfer_message,
        ))
    }

    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatReply> {
        let span = info_span!(
            "chat",
            request_id = %Uuid::new_v4(),
            turns = request.messages.len()
        );
        self.dispatch(request).instrument(span).await
    }

    async fn dispatch(&self, request: &ChatRequest) -> Result<ChatReply> {
        let messages = request.messages.as_slice();
        let Some(last) = messages.last() else {
            let intro = self.desk.respond(messages, None).await?;
            return Ok(ChatReply::greeting(intro.message, intro.suggestions));
        };

        let intent = self.classifier.detect_intent(messages).await?;
        let user = normalize_whitespace(&last.user);

        let reply = match intent {
            Intent::CheckBalance => {
                ChatReply::action(Action::for_user(ActionCommand::CheckBalance, user))
            }
            Intent::ViewUserAccountReport => {
                ChatReply::action(Action::for_user(ActionCommand::ViewUserAccountReport, user))
            }
            Intent::NoSystemAction => ChatReply::action(Action::no_action()),
            Intent::AskAssistant => {
                let answer = self.desk.respond(messages, request.user_status()).await?;
                ChatReply::assistant(answer.message, answer.suggestions)
            }
            Intent::Transfer | Intent::TransferToEachUsers | Intent::CreateChatGroup => {
                let kind = ActionKind::from_intent(intent)
                    .ok_or_else(|| AssistantError::InvalidIntent(intent.to_string()))?;
                self.fill_action(messages, kind).await?
            }
        };

        info!(intent = %intent, "Chat request handled");
        Ok(reply)
    }

    async fn fill_action(&self, messages: &[Message], kind: ActionKind) -> Result<ChatReply> {
        match self.extractor.extract(messages, kind).await? {
            SlotFill::Complete(params) => Ok(ChatReply::action(Action::new(kind.command(), params))),
            SlotFill::Clarify(question) => {
                info!(action = %kind, "Parameters incomplete, asking user");
                Ok(ChatReply::clarify(question))
            }
        }
    }
}
